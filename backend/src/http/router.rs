//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Drill-down routes mirror the link paths under the account prefix;
    // the request route takes the optional peak segments as extra routes.
    let api_v1 = Router::new()
        .route(
            "/accounts/{account_id}/concurrency",
            get(handlers::get_concurrency_summary),
        )
        .route(
            "/accounts/{account_id}/concurrencyDetail/{start_ms}/{end_ms}",
            get(handlers::get_concurrency_detail),
        )
        .route(
            "/accounts/{account_id}/concurrencyRequest/{start_ms}/{end_ms}",
            get(handlers::get_concurrency_requests),
        )
        .route(
            "/accounts/{account_id}/concurrencyRequest/{start_ms}/{end_ms}/{peak_value}",
            get(handlers::get_concurrency_requests),
        )
        .route(
            "/accounts/{account_id}/concurrencyRequest/{start_ms}/{end_ms}/{peak_value}/{peak_time_ms}",
            get(handlers::get_concurrency_requests),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
