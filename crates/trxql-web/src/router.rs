//! Axum router: maps all URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    trace::TraceLayer,
    compression::CompressionLayer,
    timeout::TimeoutLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::query::{api_query, health, index_page, index_submit};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let timeout = state.request_timeout;
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Pages
        .route("/",          get(index_page).post(index_submit))

        // API endpoints
        .route("/api/query", post(api_query))
        .route("/health",    get(health))

        // Middleware
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
