//! # Application Host Adapter
//!
//! Builds the Employee API in-process with its connection string pointed at a provisioned
//! instance and hands back an HTTP client bound to it.
//!
//! ## Override precedence
//!
//! The host loads configuration through [`ConfigLoader`] exactly as the server binary does
//! (defaults, `config/default.toml`, `config/test.toml`, `EMPLOYEE_API__*` variables). The
//! connection string given to [`AppHostBuilder::with_descriptor`] is registered as an override,
//! the last source consulted, so it wins over every file and environment value. It is
//! applied before application state is built; nothing can replace it afterwards.

use axum_test::TestServer;
use std::path::Path;
use tracing::info;

use employee_api::config::{redact_url, ConfigLoader, DEFAULT_CONNECTION_KEY};
use employee_api::web::create_app;
use employee_api::web::state::AppState;

use crate::error::{FixtureError, FixtureResult};
use crate::provisioner::ConnectionDescriptor;

/// Builder for an [`AppHost`]
#[derive(Debug, Clone)]
pub struct AppHostBuilder {
    loader: ConfigLoader,
    connection_string: Option<String>,
}

impl Default for AppHostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppHostBuilder {
    /// Loader for the `test` environment reading the workspace `config/` directory
    pub fn new() -> Self {
        let config_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("config");
        Self {
            loader: ConfigLoader::new()
                .with_environment("test")
                .with_config_dir(config_dir),
            connection_string: None,
        }
    }

    /// Replace the configuration loader; the connection override is still applied last
    pub fn with_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_descriptor(self, descriptor: &ConnectionDescriptor) -> Self {
        self.with_connection_string(descriptor.connection_string())
    }

    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    /// Build application state and the in-process server.
    ///
    /// Fails with [`FixtureError::MissingConnectionString`] when no non-blank connection
    /// string was supplied. Must run inside a Tokio runtime.
    pub fn start(self) -> FixtureResult<AppHost> {
        let connection_string = match self.connection_string {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                return Err(FixtureError::MissingConnectionString {
                    key: DEFAULT_CONNECTION_KEY.to_string(),
                })
            }
        };

        let config = self
            .loader
            .with_override(DEFAULT_CONNECTION_KEY, connection_string.as_str())
            .load()
            .map_err(|e| FixtureError::HostStart(e.to_string()))?;

        let state =
            AppState::from_config(&config).map_err(|e| FixtureError::HostStart(e.to_string()))?;

        let server = TestServer::new(create_app(state.clone()))
            .map_err(|e| FixtureError::HostStart(e.to_string()))?;

        info!(
            database_url = %redact_url(&connection_string),
            "In-process application host started"
        );

        Ok(AppHost {
            server,
            state,
            connection_string,
        })
    }
}

/// A running in-process application and its HTTP client
pub struct AppHost {
    server: TestServer,
    state: AppState,
    connection_string: String,
}

impl std::fmt::Debug for AppHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppHost")
            .field("connection_string", &redact_url(&self.connection_string))
            .finish_non_exhaustive()
    }
}

impl AppHost {
    pub fn builder() -> AppHostBuilder {
        AppHostBuilder::new()
    }

    /// HTTP client bound to the in-process application
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Connection string the application was configured with
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Close the application's pool
    pub async fn shutdown(self) {
        self.state.shutdown().await;
    }
}
