//! # Web API Application State
//!
//! Shared state for the web API: configuration, the database pool and the employee
//! service handlers delegate to.

use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, WebConfig};
use crate::database::DatabaseConnection;
use crate::error::Result;
use crate::services::{EmployeeService, PgEmployeeService};

/// Shared application state for the web API
#[derive(Clone)]
pub struct AppState {
    /// Web server configuration
    pub config: Arc<WebConfig>,

    /// Pool used for readiness checks and by the default service
    pub database: DatabaseConnection,

    /// Employee operations
    pub employee_service: Arc<dyn EmployeeService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state from a fully merged configuration.
    ///
    /// Fails when `connection_strings.default_connection` is missing; no connection is
    /// opened until the first request.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let database = DatabaseConnection::from_config(config)?;
        let employee_service = Arc::new(PgEmployeeService::new(database.pool().clone()));

        info!(
            bind_address = %config.web.bind_address,
            request_timeout_ms = config.web.request_timeout_ms,
            "Created web API application state"
        );

        Ok(Self::with_service(
            config.web.clone(),
            database,
            employee_service,
        ))
    }

    /// Assemble state around an explicit service implementation
    pub fn with_service(
        config: WebConfig,
        database: DatabaseConnection,
        employee_service: Arc<dyn EmployeeService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            database,
            employee_service,
        }
    }

    /// Close the pool so no session outlives the host
    pub async fn shutdown(&self) {
        self.database.close().await;
    }
}
