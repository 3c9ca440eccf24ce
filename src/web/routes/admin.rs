use axum::extract::{Path, Query};
use axum::routing::{delete, post};
use axum::{Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse, routing::get};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::model::entity::{Enrollment, ExamLogRow, ExamResult, UserEntity};
use crate::model::stats::{PlatformStatistics, UserStatistics};
use crate::model::{AccessTarget, CrudRepository, ResourceType, ResourceTyped, check_access};
use crate::progress::ExamKind;
use crate::web::dto::admin::ResetPasswordBody;
use crate::web::dto::exams::ExamLogQuery;
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/users/{user_id}/levels/{level_id}/assign",
            post(admin_assign_handler),
        )
        .route("/users/{user_id}", delete(admin_user_delete_handler))
        .route(
            "/users/{user_id}/reset_password",
            post(admin_reset_password_handler),
        )
        .route("/exams", get(admin_exams_handler))
        .route("/statistics", get(admin_statistics_handler))
        .route(
            "/users/{user_id}/statistics",
            get(admin_user_statistics_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{user_id}/levels/{level_id}/assign",
    description = "Enrolls a user in a level without a purchase",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user"),
        ("level_id" = Uuid, Path, description = "ID of the level to assign")
    ),
    responses(
        (status = 201, description = "Level assigned", body = Enrollment),
        (status = 403, description = "Only admins can assign levels", body = ErrorResponse),
        (status = 404, description = "Level or user not found", body = ErrorResponse),
        (status = 409, description = "User already has this level", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn admin_assign_handler(
    State(state): State<AppState>,
    Path((user_id, level_id)): Path<(Uuid, Uuid)>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    let enrollment = state.engine().enroll(user_id, level_id).await?;
    tracing::info!(admin_id = %user.user_id(), %user_id, %level_id, "level assigned");

    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/statistics",
    description = "Platform-wide purchase and completion figures",
    responses(
        (status = 200, description = "Statistics", body = PlatformStatistics),
        (status = 403, description = "Only admins can see statistics", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn admin_statistics_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    let stats = PlatformStatistics::collect(state.mm())
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Statistics, e))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{user_id}/statistics",
    description = "Completion and exam figures of one user",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Statistics", body = UserStatistics),
        (status = 403, description = "Only admins can see statistics", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn admin_user_statistics_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    let stats = UserStatistics::collect(state.mm(), user_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Statistics, e))?
        .ok_or_else(|| WebError::resource_not_found(ResourceType::User))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{user_id}",
    description = "Deletes a user together with their enrollments, progress and exam results",
    params(
        ("user_id" = Uuid, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Only admins can delete users", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn admin_user_delete_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    let found = UserEntity::find_by_id(state.mm(), user, user_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    found
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    tracing::info!(admin_id = %user.user_id(), %user_id, "user deleted");

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{user_id}/reset_password",
    description = "Replaces a user's password",
    request_body = ResetPasswordBody,
    params(
        ("user_id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Password replaced"),
        (status = 400, description = "New password is empty", body = ErrorResponse),
        (status = 403, description = "Only admins can reset passwords", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn admin_reset_password_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<ResetPasswordBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    if payload.new_password.is_empty() {
        return Err(WebError::resource_bad_request(
            UserEntity::get_resource_type(),
            "new_password is required",
        ));
    }

    let found = UserEntity::find_by_id(state.mm(), user, user_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))?;

    let hash = hash_password(&payload.new_password).map_err(WebError::server_crypt_error)?;
    found
        .set_password_hash(state.mm(), hash)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;
    tracing::info!(admin_id = %user.user_id(), %user_id, "password reset");

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/exams",
    description = "Every exam submitted on the platform, newest first",
    params(ExamLogQuery),
    responses(
        (status = 200, description = "Exam log", body = Vec<ExamLogRow>),
        (status = 400, description = "Unknown exam type", body = ErrorResponse),
        (status = 403, description = "Only admins can see the exam log", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn admin_exams_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ExamLogQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    let kind = query.kind.as_deref().map(str::parse::<ExamKind>).transpose()?;
    let log = ExamLogRow::all(state.mm(), kind)
        .await
        .map_err(|e| WebError::resource_fetch_error(ExamResult::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(log)))
}
