//! # Health Check Handlers

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::web::errors::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Basic health check: GET /health
pub async fn basic_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Readiness probe: GET /health/ready
///
/// Ready only when the database answers `SELECT 1`.
pub async fn readiness_probe(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    match state.database.health_check().await {
        Ok(true) => Ok(Json(HealthResponse {
            status: "ready".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        })),
        Ok(false) => Err(ApiError::ServiceUnavailable),
        Err(e) => {
            error!(error = %e, "Readiness check failed");
            Err(ApiError::ServiceUnavailable)
        }
    }
}
