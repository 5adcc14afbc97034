//! Push Bridge HTTP Layer
//!
//! Axum host adapter that feeds platform callbacks into the bridge, and a
//! reqwest client for the push backend.

mod backend;
mod handlers;

pub use backend::*;
pub use handlers::*;

use axum::Router;
use bridge_service::{HostEvents, TokenManager};
use tower_http::trace::TraceLayer;

/// Shared state for host adapter handlers.
#[derive(Clone)]
pub struct HostState {
    pub events: HostEvents,
    pub tokens: TokenManager,
}

/// Create the host adapter router, with request tracing.
pub fn host_router(state: HostState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/host/token", post(handlers::token_handler))
        .route("/host/device-token", post(handlers::device_token_handler))
        .route("/host/payload", post(handlers::payload_handler))
        .route("/host/tap", post(handlers::tap_handler))
        .route("/token", get(handlers::current_token_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
