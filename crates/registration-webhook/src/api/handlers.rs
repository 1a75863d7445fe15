//! HTTP request handlers.

use super::types::HealthResponse;
use super::AppState;
use crate::error::IntakeError;
use crate::intake::handle_registration;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use registrant_store::Registration;
use tracing::warn;

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    match state.store.count().await {
        Ok(count) => Json(HealthResponse {
            status: "ok".to_string(),
            registrant_count: Some(count),
        }),
        Err(e) => {
            warn!(error = %e, "Registrant store unavailable for health check");
            Json(HealthResponse {
                status: "degraded".to_string(),
                registrant_count: None,
            })
        }
    }
}

/// Receive a registration from the survey workflow.
///
/// The body is read raw so that a missing content type or malformed JSON is
/// judged by the intake rules rather than rejected by the extractor.
pub async fn register_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Registration>), IntakeError> {
    let registration =
        handle_registration(&state.api_key, state.store.as_ref(), &headers, &body).await?;

    Ok((StatusCode::CREATED, Json(registration)))
}
