//! API response types.

use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// `None` when the store could not be queried
    pub registrant_count: Option<usize>,
}
