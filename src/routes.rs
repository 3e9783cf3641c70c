//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET|HEAD /r/{slug}` - Short link redirect
//! - `GET  /health`       - Health check: DB, cache, metrics store, click queue
//! - `GET  /metrics`      - Metrics exposition text
//! - `/api/*`             - Link management and statistics
//!
//! # Middleware
//!
//! - **Security headers** - CSP, framing and sniffing protection on every response
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, metrics_handler, redirect_handler};
use crate::api::middleware::{security_headers, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// `GET` on the redirect route also serves `HEAD`, which the handler treats
/// as a non-counting probe.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/r/{slug}", get(redirect_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api::routes::api_routes())
        .with_state(state)
        .layer(middleware::from_fn(security_headers::layer))
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
