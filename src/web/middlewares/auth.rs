use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    Config, auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, WebResult, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";

/// Attaches a `RequestContext` to every request. A missing cookie yields an anonymous context,
/// a broken one rejects the request.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> WebResult<Response> {
    let user = match cookies.get(AUTH_TOKEN) {
        Some(token) => resolve_user(&state, token.value()).await?,
        None => None,
    };

    if let Some(user) = &user {
        tracing::trace!(user_id = %user.user_id(), role = %user.user_role(), "request authenticated");
    }

    req.extensions_mut().insert(RequestContext::new(user));
    Ok(next.run(req).await)
}

/// A token that outlived its user resolves to nobody.
async fn resolve_user(state: &AppState, token: &str) -> WebResult<Option<AuthenticatedUser>> {
    let secret = Config::get_or_init(false).await.app().jwt();
    let claims = auth::process_token(token, secret)
        .map_err(|e| WebError::auth_cookie_invalid(AUTH_TOKEN, e))?
        .claims;

    let id = claims
        .user_id()
        .ok_or_else(|| WebError::auth_subject_invalid(&claims.sub))?;

    let user = UserEntity::find_by_id(state.mm(), &AuthenticatedUser::system(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok(user.map(|user| AuthenticatedUser::new(user.id(), user.role())))
}
