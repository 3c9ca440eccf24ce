use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::get};
use uuid::Uuid;

use crate::model::entity::{Enrollment, Level, LevelCreate, Video, VideoCreate, VideoWithStatusRow};
use crate::model::{AccessTarget, CrudRepository, DatabaseError, ResourceTyped, check_access};
use crate::web::dto::levels::{LevelResponse, VideoBody};
use crate::web::error::ErrorResponse;
use crate::web::{AppState, RequestContext, WebError, WebResult, middlewares};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/new", post(levels_create_handler))
        .route(
            "/{id}",
            get(levels_get_handler)
                .put(levels_update_handler)
                .delete(levels_delete_handler),
        )
        .route("/{id}/videos", post(videos_create_handler))
        .route(
            "/videos/{id}",
            put(videos_update_handler).delete(videos_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn validate_level(payload: &LevelCreate) -> WebResult<()> {
    if payload.name.trim().is_empty() {
        return Err(WebError::resource_bad_request(
            Level::get_resource_type(),
            "name is required",
        ));
    }
    if !payload.price.is_finite() || payload.price < 0.0 {
        return Err(WebError::resource_bad_request(
            Level::get_resource_type(),
            "price must be a non-negative number",
        ));
    }
    Ok(())
}

fn validate_video(payload: &VideoBody) -> WebResult<()> {
    if payload.link.trim().is_empty() {
        return Err(WebError::resource_bad_request(
            Video::get_resource_type(),
            "link is required",
        ));
    }
    Ok(())
}

fn video_write_error(error: DatabaseError) -> WebError {
    if error.is_unique_violation() {
        return WebError::resource_bad_request(
            Video::get_resource_type(),
            "order_index is already taken in this level",
        );
    }
    WebError::resource_fetch_error(Video::get_resource_type(), error)
}

#[utoipa::path(
    post,
    path = "/api/v1/levels/new",
    description = "Creates a level",
    request_body = LevelCreate,
    responses(
        (status = 201, description = "Level created", body = Level),
        (status = 400, description = "Invalid level", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Only admins can create levels", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "levels"
)]
async fn levels_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LevelCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;
    validate_level(&payload)?;

    let level = Level::create(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Level::get_resource_type(), e))?;
    tracing::info!(level_id = %level.id(), "level created");

    Ok((StatusCode::CREATED, Json(level)))
}

#[utoipa::path(
    get,
    path = "/api/v1/levels/{level_id}",
    description = "Level with its videos as seen by the caller. Video content is revealed once opened",
    params(
        ("level_id" = Uuid, Path, description = "ID of the level to get")
    ),
    responses(
        (status = 200, description = "Level found", body = LevelResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Level not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "levels"
)]
async fn levels_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let level = Level::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Level::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Level::get_resource_type()))?;

    let enrollment = Enrollment::find(state.mm(), user.user_id(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;
    let videos = VideoWithStatusRow::all_by_level(state.mm(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Video::get_resource_type(), e))?;

    let response = LevelResponse::new(level, enrollment, videos, user.is_admin());
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/v1/levels/{level_id}",
    description = "Updates a level. Omitted texts keep their value",
    request_body = LevelCreate,
    params(
        ("level_id" = Uuid, Path, description = "ID of the level to update")
    ),
    responses(
        (status = 200, description = "Level updated", body = Level),
        (status = 400, description = "Invalid level", body = ErrorResponse),
        (status = 403, description = "Only admins can update levels", body = ErrorResponse),
        (status = 404, description = "Level not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "levels"
)]
async fn levels_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<LevelCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;
    validate_level(&payload)?;

    let level = Level::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Level::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Level::get_resource_type()))?;

    let updated = level
        .update(state.mm(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Level::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/levels/{level_id}",
    description = "Deletes a level together with its videos, enrollments and exam results",
    params(
        ("level_id" = Uuid, Path, description = "ID of the level to delete")
    ),
    responses(
        (status = 200, description = "Level deleted"),
        (status = 403, description = "Only admins can delete levels", body = ErrorResponse),
        (status = 404, description = "Level not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "levels"
)]
async fn levels_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    let level = Level::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Level::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Level::get_resource_type()))?;

    level
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Level::get_resource_type(), e))?;
    tracing::info!(level_id = %id, "level deleted");

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/levels/{level_id}/videos",
    description = "Appends a video to a level, or places it at `order_index`",
    request_body = VideoBody,
    params(
        ("level_id" = Uuid, Path, description = "ID of the level")
    ),
    responses(
        (status = 201, description = "Video created", body = Video),
        (status = 400, description = "Invalid video or order_index taken", body = ErrorResponse),
        (status = 403, description = "Only admins can add videos", body = ErrorResponse),
        (status = 404, description = "Level not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "levels"
)]
async fn videos_create_handler(
    State(state): State<AppState>,
    Path(level_id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<VideoBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;
    validate_video(&payload)?;

    let exists = Level::find_by_id(state.mm(), user, level_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Level::get_resource_type(), e))?
        .is_some();

    if !exists {
        return Err(WebError::resource_not_found(Level::get_resource_type()));
    }

    let video = Video::create(
        state.mm(),
        user,
        VideoCreate {
            level_id,
            link: payload.link,
            questions: payload.questions,
            order_index: payload.order_index,
        },
    )
    .await
    .map_err(video_write_error)?;

    Ok((StatusCode::CREATED, Json(video)))
}

#[utoipa::path(
    put,
    path = "/api/v1/levels/videos/{video_id}",
    description = "Updates a video's link, questions or position",
    request_body = VideoBody,
    params(
        ("video_id" = Uuid, Path, description = "ID of the video to update")
    ),
    responses(
        (status = 200, description = "Video updated", body = Video),
        (status = 400, description = "Invalid video or order_index taken", body = ErrorResponse),
        (status = 403, description = "Only admins can update videos", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "levels"
)]
async fn videos_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<VideoBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;
    validate_video(&payload)?;

    let video = Video::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Video::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Video::get_resource_type()))?;

    let data = VideoCreate {
        level_id: video.level_id(),
        link: payload.link,
        questions: payload.questions,
        order_index: payload.order_index,
    };
    let updated = video
        .update(state.mm(), user, data)
        .await
        .map_err(video_write_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/levels/videos/{video_id}",
    description = "Deletes a video and every progress entry pointing at it",
    params(
        ("video_id" = Uuid, Path, description = "ID of the video to delete")
    ),
    responses(
        (status = 200, description = "Video deleted"),
        (status = 403, description = "Only admins can delete videos", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "levels"
)]
async fn videos_delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    check_access(user, AccessTarget::AdminOnly)?;

    let video = Video::find_by_id(state.mm(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Video::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Video::get_resource_type()))?;

    video
        .delete(state.mm(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Video::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
