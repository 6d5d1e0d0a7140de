//! Route configuration.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{Router, get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers::{get_log, health_check};
use crate::rate_limit::limit_requests;
use crate::state::AppState;

/// Create the API router.
///
/// Every route, health included, counts against the rate limit.
pub fn create_router(state: Arc<AppState>) -> Router {
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            limit_requests,
        ));

    Router::new()
        .route("/logs", get(get_log))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(layers)
}
