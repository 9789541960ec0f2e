//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{export, health, samples, stats, usage};
use crate::state::AppState;

/// Maximum concurrent requests for endpoints that fan out to the backends.
/// A single usage table can issue one statistic lookup per meter.
const BACKEND_MAX_CONCURRENT_REQUESTS: usize = 16;

/// Maximum concurrent PDF renders.
const EXPORT_MAX_CONCURRENT_REQUESTS: usize = 4;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Metering views (backend calls, rate-limited)
/// - `GET /v1/usage/:category` - Global usage table (`?q=` filters by tenant)
/// - `GET /v1/stats` - Chartable meters and resources per tenant/user
/// - `GET /v1/samples` - Series of one meter on one resource as CSV
///
/// ## Export (CPU-bound, rate-limited)
/// - `POST /v1/export` - SVG chart to PDF
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let backend_routes = Router::new()
        .route("/usage/:category", get(usage::get_usage))
        .route("/stats", get(stats::get_stats))
        .route("/samples", get(samples::get_samples))
        .layer(ConcurrencyLimitLayer::new(BACKEND_MAX_CONCURRENT_REQUESTS));

    let export_routes = Router::new()
        .route("/export", post(export::export_chart))
        .layer(ConcurrencyLimitLayer::new(EXPORT_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/v1", backend_routes.merge(export_routes))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        // Extractors enforce their own 2MB default unless replaced.
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
