//! API module
//!
//! HTTP handlers for the research service and the router that mounts them.

pub mod health;
pub mod middleware;
pub mod research;
pub mod streaming;
pub mod utils;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Routes of the research service, without middleware
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health::hello))
        .route("/api/health", get(health::health_check))
        .route("/api/research", post(research::start_research))
        .route("/api/research/status", get(research::get_status))
        .route(
            "/api/research/history",
            get(research::get_history).delete(research::clear_history),
        )
        .with_state(state)
}

/// Routes plus request-id, trace and CORS layers, as served by the binary
pub fn app(state: Arc<AppState>) -> Router {
    // Outermost layer last: CORS, then trace, then request id around the handlers
    router(state)
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
