//! Email verification endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::state::AuthState;
use super::types::{SessionResponse, VerifyEmailRequest};
use crate::api::guard::{self, CurrentIdentity};
use crate::auth::Error;

#[utoipa::path(
    post,
    path = "/v1/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified, fresh session issued", body = SessionResponse),
        (status = 400, description = "Missing payload or code", body = String),
        (status = 401, description = "Not authenticated or invalid/expired code", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    auth_state: Extension<Arc<AuthState>>,
    Extension(CurrentIdentity(identity)): Extension<CurrentIdentity>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Result<Response, Error> {
    let Some(Json(request)) = payload else {
        return Ok((StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response());
    };
    let code = request.code.trim();
    if code.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, "Missing code".to_string()).into_response());
    }

    // Fails closed: verification is only reachable with a live session.
    let Some(identity) = identity else {
        return Err(Error::Authentication);
    };

    let consumed = auth_state
        .verification()
        .consume(&identity.user.id, &identity.user.email, code)
        .await?;
    if !consumed {
        return Err(Error::Authentication);
    }

    // Force re-authentication everywhere else, then hand this requester a
    // brand-new session: its own session was just invalidated with the rest.
    auth_state.sessions().invalidate_all(&identity.user.id).await?;
    auth_state
        .store()
        .update_user_verified(&identity.user.id, true)
        .await?;
    let session = auth_state.sessions().create(&identity.user.id).await?;

    let mut headers = HeaderMap::new();
    if let Ok(cookie) = guard::session_cookie(auth_state.config(), &session.id) {
        headers.insert(SET_COOKIE, cookie);
    }

    Ok((
        StatusCode::OK,
        headers,
        Json(SessionResponse {
            user_id: identity.user.id,
            email: identity.user.email,
            email_verified: true,
        }),
    )
        .into_response())
}
