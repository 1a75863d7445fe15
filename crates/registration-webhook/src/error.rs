//! Error types for the registration webhook.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use registrant_store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Reasons a registration submission is rejected.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("API-Key is not correct.")]
    Unauthorized,

    #[error("Email is required")]
    MissingEmail,

    #[error("Failed to store registration: {0}")]
    Storage(#[from] StoreError),
}

impl IntakeError {
    pub fn status(&self) -> StatusCode {
        match self {
            IntakeError::Unauthorized => StatusCode::UNAUTHORIZED,
            IntakeError::MissingEmail => StatusCode::BAD_REQUEST,
            IntakeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller. Storage details stay in the logs.
    pub fn client_message(&self) -> &'static str {
        match self {
            IntakeError::Unauthorized => "API-Key is not correct.",
            IntakeError::MissingEmail => "Email is required",
            IntakeError::Storage(_) => "An internal server error occurred.",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.client_message().to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}
