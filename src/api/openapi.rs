//! OpenAPI document, generated from the `#[utoipa::path]` annotations and
//! served at `/openapi.json`.

use axum::response::Json;
use utoipa::OpenApi;

use super::handlers::{auth, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::signup::signup,
        auth::login::login,
        auth::session::session,
        auth::session::logout,
        auth::verification::verify_email,
    ),
    components(schemas(
        health::Health,
        auth::types::SignupRequest,
        auth::types::LoginRequest,
        auth::types::VerifyEmailRequest,
        auth::types::SessionResponse,
    )),
    tags(
        (name = "auth", description = "Signup, login, sessions and email verification"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
