//! Signup endpoint.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use uuid::Uuid;

use super::state::AuthState;
use super::types::{SessionResponse, SignupRequest};
use super::utils::valid_email;
use crate::api::{email, guard};
use crate::auth::{password, Error};
use crate::store::UserRecord;

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, session issued", body = SessionResponse),
        (status = 400, description = "Validation error or signup failed", body = String)
    ),
    tag = "auth"
)]
pub async fn signup(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignupRequest>>,
) -> Result<Response, Error> {
    let Some(Json(request)) = payload else {
        return Ok((StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response());
    };

    let email = request.email.trim().to_string();
    if !valid_email(&email) {
        return Err(Error::Validation("email"));
    }
    let password = request.password.expose_secret().to_string();
    if password.is_empty() {
        return Err(Error::Validation("password"));
    }

    let password_hash = password::hash_blocking(password)
        .await
        .map_err(Error::Infrastructure)?;
    let user = UserRecord {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: Some(password_hash),
        email_verified: false,
    };
    // A duplicate email surfaces as a generic Conflict here; the response
    // does not say which field was the problem.
    auth_state.store().insert_user(&user).await?;

    let code = auth_state
        .verification()
        .issue(&user.id, &user.email)
        .await?;
    let minutes = auth_state.config().verification_code_ttl_seconds() / 60;
    email::deliver_best_effort(
        auth_state.mailer().clone(),
        user.email.clone(),
        "Verify your email address".to_string(),
        format!("Your verification code is: {code}\nThe code expires in {minutes} minutes."),
    )
    .await;

    let session = auth_state.sessions().create(&user.id).await?;
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = guard::session_cookie(auth_state.config(), &session.id) {
        headers.insert(SET_COOKIE, cookie);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(SessionResponse {
            user_id: user.id,
            email: user.email,
            email_verified: false,
        }),
    )
        .into_response())
}
