//! Error taxonomy for the authentication core.
//!
//! The variants map to response classes, and the mapping is deliberately
//! lossy: a response never reveals whether an email exists, whether the
//! password or the code was the wrong part, or which internal step failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input on a specific field; the only field-level error.
    #[error("invalid {0}")]
    Validation(&'static str),
    /// Duplicate email on signup. Surfaced generically so the response does
    /// not single out the email field.
    #[error("signup failed")]
    Conflict,
    /// Bad credentials, bad/expired/used verification code, missing session.
    /// One message for every cause.
    #[error("invalid credentials")]
    Authentication,
    /// Cross-origin mutating request.
    #[error("origin rejected")]
    OriginRejected,
    /// Store or network failure; fatal for the request, no cleanup attempted.
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::Unavailable(err) => Self::Infrastructure(err),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(field) => (StatusCode::BAD_REQUEST, format!("Invalid {field}")),
            Self::Conflict => (StatusCode::BAD_REQUEST, "Signup failed".to_string()),
            Self::Authentication => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
            ),
            Self::OriginRejected => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            Self::Infrastructure(err) => {
                error!("Request failed: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, message).into_response()
    }
}
