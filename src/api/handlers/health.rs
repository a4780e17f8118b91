//! Health endpoint: store connectivity plus build identity.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use super::auth::AuthState;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    name: String,
    version: String,
    store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store is reachable", body = Health),
        (status = 503, description = "Store is unreachable", body = Health)
    ),
    tag = "health"
)]
pub async fn health(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let backend = auth_state.store().backend();
    let status = match auth_state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            error!("Failed to ping store: {err}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let health = Health {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: format!(
            "{backend}: {}",
            if status == StatusCode::OK { "ok" } else { "unavailable" }
        ),
    };

    (status, Json(health))
}
