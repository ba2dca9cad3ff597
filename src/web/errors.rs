//! # Web API Error Types
//!
//! Defines error types specific to the web API and their HTTP response conversions.
//! Leverages thiserror for structured error handling and Axum's IntoResponse for HTTP conversion.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::logging::log_error;
use crate::services::EmployeeServiceError;

/// Message returned when a write unexpectedly affects no rows
pub const WRITE_FAILED_MESSAGE: &str = "A problem happened while handling your request.";

/// Web API specific errors with HTTP status code mappings
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    #[error("Database operation failed: {operation}")]
    DatabaseError { operation: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a NotFound error with a custom message
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a BadRequest error with a custom message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a DatabaseError with operation context
    pub fn database_error(operation: impl Into<String>) -> Self {
        Self::DatabaseError {
            operation: operation.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::DatabaseError { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let (error_code, message) = match &self {
            ApiError::NotFound { message } => ("NOT_FOUND", message.as_str()),
            ApiError::BadRequest { message } => ("BAD_REQUEST", message.as_str()),
            ApiError::ServiceUnavailable => {
                ("SERVICE_UNAVAILABLE", "Service temporarily unavailable")
            }
            ApiError::DatabaseError { operation } => ("DATABASE_ERROR", operation.as_str()),
            ApiError::Internal { message } => ("INTERNAL_ERROR", message.as_str()),
        };

        if status_code.is_server_error() {
            log_error("web_api", error_code, &self.to_string(), None);
        }

        let error_response = json!({
            "error": {
                "code": error_code,
                "message": message
            }
        });

        (status_code, Json(error_response)).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Row not found"),
            sqlx::Error::PoolTimedOut => ApiError::ServiceUnavailable,
            sqlx::Error::Database(_) => ApiError::database_error("Database operation failed"),
            _ => ApiError::database_error("Database error"),
        }
    }
}

impl From<EmployeeServiceError> for ApiError {
    fn from(err: EmployeeServiceError) -> Self {
        match err {
            EmployeeServiceError::Database(e) => e.into(),
        }
    }
}

/// Malformed or non-JSON bodies are client errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// Result type alias for web API operations
pub type ApiResult<T> = Result<T, ApiError>;
