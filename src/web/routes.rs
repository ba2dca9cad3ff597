//! # Web API Route Definitions

use crate::web::handlers;
use crate::web::state::AppState;
use axum::routing::get;
use axum::Router;

/// Employee CRUD routes under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/api/v1/:id",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
}

/// Liveness and readiness probes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::basic_health))
        .route("/health/ready", get(handlers::health::readiness_probe))
}
