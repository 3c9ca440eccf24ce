use axum::extract::Path;
use axum::routing::post;
use axum::{Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get};
use uuid::Uuid;

use crate::model::entity::ExamResult;
use crate::model::{AccessTarget, ResourceTyped, check_access};
use crate::progress::{ExamKind, ExamSubmission};
use crate::web::dto::exams::ExamBody;
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{level_id}/initial", post(exams_initial_handler))
        .route("/{level_id}/final", post(exams_final_handler))
        .route("/{level_id}/user/{user_id}", get(exams_history_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn submit(
    state: &AppState,
    ctx: &RequestContext,
    level_id: Uuid,
    kind: ExamKind,
    body: ExamBody,
) -> WebResult<ExamSubmission> {
    let user = ctx.user()?;
    let submission = state
        .engine()
        .submit_exam(user.user_id(), level_id, kind, body.into())
        .await?;
    Ok(submission)
}

#[utoipa::path(
    post,
    path = "/api/v1/exams/{level_id}/initial",
    description = "Records the caller's initial exam. Retakes overwrite the stored score",
    request_body = ExamBody,
    params(
        ("level_id" = Uuid, Path, description = "ID of the level")
    ),
    responses(
        (status = 201, description = "Exam recorded", body = ExamSubmission),
        (status = 400, description = "Level not purchased", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "exams"
)]
async fn exams_initial_handler(
    State(state): State<AppState>,
    Path(level_id): Path<Uuid>,
    ctx: RequestContext,
    Json(body): Json<ExamBody>,
) -> WebResult<impl IntoResponse> {
    let submission = submit(&state, &ctx, level_id, ExamKind::Initial, body).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    post,
    path = "/api/v1/exams/{level_id}/final",
    description = "Records the caller's final exam and completes the level. Requires every video completed",
    request_body = ExamBody,
    params(
        ("level_id" = Uuid, Path, description = "ID of the level")
    ),
    responses(
        (status = 201, description = "Exam recorded", body = ExamSubmission),
        (status = 400, description = "Level not purchased or final exam locked", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "exams"
)]
async fn exams_final_handler(
    State(state): State<AppState>,
    Path(level_id): Path<Uuid>,
    ctx: RequestContext,
    Json(body): Json<ExamBody>,
) -> WebResult<impl IntoResponse> {
    let submission = submit(&state, &ctx, level_id, ExamKind::Final, body).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/api/v1/exams/{level_id}/user/{user_id}",
    description = "Every exam the user submitted for the level, oldest first",
    params(
        ("level_id" = Uuid, Path, description = "ID of the level"),
        ("user_id" = Uuid, Path, description = "ID of the examinee")
    ),
    responses(
        (status = 200, description = "Exam history", body = Vec<ExamResult>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You can only see your own exams", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "exams"
)]
async fn exams_history_handler(
    State(state): State<AppState>,
    Path((level_id, user_id)): Path<(Uuid, Uuid)>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::Owner(user_id))?;

    let history = ExamResult::all_by_user_level(state.mm(), user_id, level_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ExamResult::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(history)))
}
