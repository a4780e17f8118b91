//! Session introspection and logout.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::state::AuthState;
use super::types::SessionResponse;
use crate::api::guard::{self, CurrentIdentity};

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(Extension(CurrentIdentity(identity)): Extension<CurrentIdentity>) -> Response {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    match &identity {
        Some(identity) => (
            StatusCode::OK,
            Json(SessionResponse {
                user_id: identity.user.id.clone(),
                email: identity.user.email.clone(),
                email_verified: identity.user.email_verified,
            }),
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    auth_state: Extension<Arc<AuthState>>,
    Extension(CurrentIdentity(identity)): Extension<CurrentIdentity>,
) -> Response {
    if let Some(identity) = &identity {
        if let Err(err) = auth_state.sessions().invalidate(&identity.session.id).await {
            error!("Failed to invalidate session: {err}");
        }
    }

    // Always clear the cookie, even if no session was resolved.
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = guard::clear_session_cookie(auth_state.config()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, headers).into_response()
}
