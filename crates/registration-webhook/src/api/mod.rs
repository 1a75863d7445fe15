//! HTTP API for the registration webhook.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, require_api_key};
pub use types::*;

use crate::intake::ApiKey;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use registrant_store::RegistrantStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Path the survey workflow posts registrations to.
pub const REGISTRATION_PATH: &str = "/post/user";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Expected shared secret
    pub api_key: Arc<ApiKey>,
    /// Registrant storage backend
    pub store: Arc<dyn RegistrantStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(api_key: ApiKey, store: Arc<dyn RegistrantStore>) -> Self {
        Self {
            api_key: Arc::new(api_key),
            store,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            REGISTRATION_PATH,
            post(handlers::register_user).route_layer(axum_middleware::from_fn_with_state(
                state.clone(),
                require_api_key,
            )),
        )
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
