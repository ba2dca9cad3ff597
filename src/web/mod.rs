//! # Web API Module
//!
//! Axum-based REST API exposing employee CRUD under `/api/v1` plus health probes.
//!
//! ## Core Components
//!
//! - [`routes`] - HTTP route definitions
//! - [`handlers`] - Request handlers for employees and health
//! - [`middleware`] - Request ID propagation
//! - [`state`] - Shared application state
//! - [`errors`] - API error type and its HTTP rendering

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;

/// Create the main Axum application with all routes and middleware
///
/// Layers, outermost first: tracing, optional CORS, request timeout, request ID.
pub fn create_app(app_state: AppState) -> Router {
    let request_timeout = app_state.config.request_timeout();
    let cors_enabled = app_state.config.cors_enabled;

    let mut router = Router::new()
        .merge(routes::health_routes())
        .merge(routes::api_v1_routes())
        .layer(axum::middleware::from_fn(
            middleware::request_id::add_request_id,
        ))
        .layer(tower_http::timeout::TimeoutLayer::new(request_timeout));

    if cors_enabled {
        router = router.layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );
    }

    router
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}
