use axum::{Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get};

use crate::model::entity::WelcomeVideo;
use crate::model::{AccessTarget, ResourceTyped, check_access};
use crate::web::dto::admin::WelcomeVideoBody;
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/api/v1/welcome_video",
            get(welcome_get_handler).post(welcome_set_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/welcome_video",
    description = "The introduction video shown before any purchase",
    responses(
        (status = 200, description = "Welcome video", body = WelcomeVideo),
        (status = 404, description = "No welcome video set", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "levels"
)]
async fn welcome_get_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let video = WelcomeVideo::get(state.mm())
        .await
        .map_err(|e| WebError::resource_fetch_error(WelcomeVideo::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(WelcomeVideo::get_resource_type()))?;

    Ok((StatusCode::OK, Json(video)))
}

#[utoipa::path(
    post,
    path = "/api/v1/welcome_video",
    description = "Sets the welcome video, replacing the previous one",
    request_body = WelcomeVideoBody,
    responses(
        (status = 200, description = "Welcome video set", body = WelcomeVideo),
        (status = 400, description = "Video URL is empty", body = ErrorResponse),
        (status = 403, description = "Only admins can set the welcome video", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "levels"
)]
async fn welcome_set_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<WelcomeVideoBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    let video_url = payload.video_url.trim();
    if video_url.is_empty() {
        return Err(WebError::resource_bad_request(
            WelcomeVideo::get_resource_type(),
            "video_url is required",
        ));
    }

    let video = WelcomeVideo::set(state.mm(), video_url)
        .await
        .map_err(|e| WebError::resource_fetch_error(WelcomeVideo::get_resource_type(), e))?;
    tracing::info!(admin_id = %user.user_id(), "welcome video set");

    Ok((StatusCode::OK, Json(video)))
}
