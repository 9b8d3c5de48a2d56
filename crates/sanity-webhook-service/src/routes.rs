//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, webhooks};
use crate::middleware::protect;
use crate::state::AppState;

/// Maximum concurrent requests across all webhook paths.
/// Each in-flight webhook may buffer a full body.
const WEBHOOK_MAX_CONCURRENT_REQUESTS: usize = 64;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Webhooks (Signature verification)
/// - `POST <path>` - Sanity webhooks, one route per configured path, at most
///   64 in flight
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let request_timeout_seconds = state.config.request_timeout_seconds;
    let guard = Arc::clone(&state.guard);

    let state = Arc::new(state);

    // Webhook routes, guarded and sharing one concurrency limit
    let mut webhook_routes = Router::new();
    for path in guard.paths() {
        webhook_routes = webhook_routes.route(path, post(webhooks::receive));
    }
    let webhook_routes = limit_concurrency(
        protect(webhook_routes, guard),
        WEBHOOK_MAX_CONCURRENT_REQUESTS,
    );

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .merge(webhook_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Limit every route of `router` to `max` requests in flight in total.
fn limit_concurrency<S>(router: Router<S>, max: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(GlobalConcurrencyLimitLayer::new(max))
}
