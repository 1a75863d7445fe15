//! Authentication and request logging middleware.

use super::AppState;
use crate::error::IntakeError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};

/// Reject requests without the shared secret before the body is read.
///
/// Runs ahead of the body extractor, so an oversized body with a bad key is
/// still answered with 401.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, IntakeError> {
    if !state.api_key.verify_headers(request.headers()) {
        error!("Api-Key is not correct.");
        return Err(IntakeError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Log every request with its outcome and latency.
///
/// Server errors are logged at error level, client errors at warn.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    if status.is_server_error() {
        error!(%method, %path, status = status.as_u16(), latency_ms, "Request failed");
    } else if status.is_client_error() {
        warn!(%method, %path, status = status.as_u16(), latency_ms, "Request rejected");
    } else {
        info!(%method, %path, status = status.as_u16(), latency_ms, "Request completed");
    }

    response
}
