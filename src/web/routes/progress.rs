use axum::extract::Path;
use axum::routing::{patch, post};
use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get,
};
use uuid::Uuid;

use crate::model::entity::{
    Enrollment, EnrollmentOverviewRow, VideoProgress, VideoProgressOverviewRow,
};
use crate::model::{AccessTarget, ResourceTyped, check_access};
use crate::progress::{ProgressRecount, VideoCompletion};
use crate::web::dto::progress::LevelProgressResponse;
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{user_id}/levels", get(progress_overview_handler))
        .route(
            "/{user_id}/levels/{level_id}/purchase",
            post(progress_purchase_handler),
        )
        .route(
            "/{user_id}/levels/{level_id}/videos/{video_id}/complete",
            patch(progress_complete_video_handler),
        )
        .route(
            "/{user_id}/levels/{level_id}/progress",
            patch(progress_recompute_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/levels/{level_id}/purchase",
    description = "Enrolls the user in a level. Only the first video starts opened",
    params(
        ("user_id" = Uuid, Path, description = "ID of the buyer"),
        ("level_id" = Uuid, Path, description = "ID of the level to purchase")
    ),
    responses(
        (status = 201, description = "Level purchased", body = Enrollment),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You can only purchase for yourself", body = ErrorResponse),
        (status = 404, description = "Level or user not found", body = ErrorResponse),
        (status = 409, description = "Level already purchased", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "progress"
)]
async fn progress_purchase_handler(
    State(state): State<AppState>,
    Path((user_id, level_id)): Path<(Uuid, Uuid)>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::Owner(user_id))?;

    let enrollment = state.engine().enroll(user_id, level_id).await?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}/levels/{level_id}/videos/{video_id}/complete",
    description = "Marks a video completed, opens the next one and unlocks the final exam after the last",
    params(
        ("user_id" = Uuid, Path, description = "ID of the learner"),
        ("level_id" = Uuid, Path, description = "ID of the level"),
        ("video_id" = Uuid, Path, description = "ID of the completed video")
    ),
    responses(
        (status = 200, description = "Video completed", body = VideoCompletion),
        (status = 400, description = "Level not purchased or video not accessible", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You can only progress yourself", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "progress"
)]
async fn progress_complete_video_handler(
    State(state): State<AppState>,
    Path((user_id, level_id, video_id)): Path<(Uuid, Uuid, Uuid)>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::Owner(user_id))?;

    let completion = state
        .engine()
        .complete_video(user_id, level_id, video_id)
        .await?;

    Ok((StatusCode::OK, Json(completion)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}/levels/{level_id}/progress",
    description = "Recounts completed videos and unlocks the final exam when all are done",
    params(
        ("user_id" = Uuid, Path, description = "ID of the learner"),
        ("level_id" = Uuid, Path, description = "ID of the level")
    ),
    responses(
        (status = 200, description = "Progress recomputed", body = ProgressRecount),
        (status = 400, description = "Level not purchased", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You can only progress yourself", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "progress"
)]
async fn progress_recompute_handler(
    State(state): State<AppState>,
    Path((user_id, level_id)): Path<(Uuid, Uuid)>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::Owner(user_id))?;

    let recount = state.engine().recompute(user_id, level_id).await?;

    Ok((StatusCode::OK, Json(recount)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/levels",
    description = "Progress of the user in every purchased level",
    params(
        ("user_id" = Uuid, Path, description = "ID of the learner")
    ),
    responses(
        (status = 200, description = "Progress found", body = Vec<LevelProgressResponse>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You can only see your own progress", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "progress"
)]
async fn progress_overview_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::Owner(user_id))?;

    let (enrollments, videos) = tokio::try_join!(
        EnrollmentOverviewRow::all_by_user(state.mm(), user_id),
        VideoProgressOverviewRow::all_by_user(state.mm(), user_id),
    )
    .map_err(|e| WebError::resource_fetch_error(VideoProgress::get_resource_type(), e))?;

    let res = LevelProgressResponse::from_rows(user_id, enrollments, videos);
    Ok((StatusCode::OK, Json(res)))
}
