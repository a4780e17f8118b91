use axum::response::IntoResponse;

/// Undocumented liveness route, returns the service banner.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
