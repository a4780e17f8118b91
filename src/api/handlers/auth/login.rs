//! Login endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use secrecy::ExposeSecret;
use std::sync::Arc;

use super::state::AuthState;
use super::types::{LoginRequest, SessionResponse};
use crate::api::guard;
use crate::auth::{password, Error};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 401, description = "Invalid email or password", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, Error> {
    let Some(Json(request)) = payload else {
        return Ok((StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response());
    };

    let email = request.email.trim().to_string();
    let plaintext = request.password.expose_secret().to_string();

    let user = auth_state.store().find_user_by_email(&email).await?;

    // Unknown email and passwordless account still verify against a dummy
    // hash so both cost the same as a wrong password.
    let (stored, user) = match user {
        Some(user) => match user.password_hash.clone() {
            Some(stored) => (stored, Some(user)),
            None => (password::dummy_hash().to_string(), None),
        },
        None => (password::dummy_hash().to_string(), None),
    };

    let matched = password::verify_blocking(stored, plaintext)
        .await
        .map_err(Error::Infrastructure)?;
    let Some(user) = user.filter(|_| matched) else {
        return Err(Error::Authentication);
    };

    // Unverified users may log in; gating on the flag is a presentation
    // concern, and login never flips it.
    let session = auth_state.sessions().create(&user.id).await?;
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = guard::session_cookie(auth_state.config(), &session.id) {
        headers.insert(SET_COOKIE, cookie);
    }

    Ok((
        StatusCode::OK,
        headers,
        Json(SessionResponse {
            user_id: user.id,
            email: user.email,
            email_verified: user.email_verified,
        }),
    )
        .into_response())
}
