//! # PostgreSQL Container
//!
//! Plain `postgres` image started through testcontainers' async runner.

use sqlx::{Connection, PgConnection};
use std::time::{Duration, Instant};
use testcontainers::core::error::WaitContainerError;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt, TestcontainersError};
use tracing::{debug, info, warn};

use super::descriptor::ConnectionDescriptor;
use crate::error::{FixtureError, FixtureResult};

/// Port PostgreSQL listens on inside the container
pub const POSTGRES_PORT: u16 = 5432;

const READY_MESSAGE: &str = "database system is ready to accept connections";
const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Container settings; [`PostgresContainer::start`] turns them into a running instance
#[derive(Debug, Clone)]
pub struct PostgresContainer {
    image: String,
    tag: String,
    username: String,
    password: String,
    database: String,
    startup_timeout: Duration,
}

impl Default for PostgresContainer {
    fn default() -> Self {
        Self {
            image: "postgres".to_string(),
            tag: "16-alpine".to_string(),
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "testdb".to_string(),
            startup_timeout: Duration::from_secs(60),
        }
    }
}

impl PostgresContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: &str, tag: &str) -> Self {
        self.image = image.to_string();
        self.tag = tag.to_string();
        self
    }

    /// Logical database the fixture creates and the application uses.
    ///
    /// It is not created by the container; see [`crate::schema::ensure_database`].
    pub fn with_database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    pub fn with_user(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }

    /// Start the container and wait until the server accepts connections on its mapped port.
    ///
    /// Fails with [`FixtureError::ProvisioningTimeout`] when the server is not reachable
    /// within the startup timeout; the container is stopped before returning.
    pub async fn start(&self) -> FixtureResult<PostgresInstance> {
        let started = Instant::now();
        let deadline = started + self.startup_timeout;

        info!(
            image = %format!("{}:{}", self.image, self.tag),
            database = %self.database,
            timeout_secs = self.startup_timeout.as_secs(),
            "Starting PostgreSQL container"
        );

        let request = GenericImage::new(self.image.as_str(), self.tag.as_str())
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(READY_MESSAGE))
            .with_env_var("POSTGRES_USER", self.username.as_str())
            .with_env_var("POSTGRES_PASSWORD", self.password.as_str())
            .with_startup_timeout(self.startup_timeout);

        let container = match request.start().await {
            Ok(container) => container,
            Err(e) if is_startup_timeout(&e) => {
                warn!(error = %e, "Container did not become ready in time");
                return Err(FixtureError::ProvisioningTimeout {
                    timeout: self.startup_timeout,
                });
            }
            Err(e) => return Err(FixtureError::Container(e)),
        };

        let mut instance = match self.bind(container).await {
            Ok(instance) => instance,
            Err((container, e)) => {
                let _ = container.stop().await;
                return Err(e);
            }
        };

        if let Err(e) = instance.wait_until_ready(deadline, self.startup_timeout).await {
            let _ = instance.stop().await;
            return Err(e);
        }

        info!(
            host = %instance.host,
            port = instance.port,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "PostgreSQL container ready"
        );

        Ok(instance)
    }

    /// Resolve the host address and mapped port of a started container
    async fn bind(
        &self,
        container: ContainerAsync<GenericImage>,
    ) -> Result<PostgresInstance, (ContainerAsync<GenericImage>, FixtureError)> {
        let host = match container.get_host().await {
            Ok(host) => host.to_string(),
            Err(e) => return Err((container, e.into())),
        };
        let port = match container.get_host_port_ipv4(POSTGRES_PORT.tcp()).await {
            Ok(port) => port,
            Err(e) => return Err((container, e.into())),
        };

        Ok(PostgresInstance {
            container: Some(container),
            host,
            port,
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        })
    }
}

/// A running container and the coordinates it was bound to.
///
/// Coordinates are fixed once [`PostgresContainer::start`] returns.
pub struct PostgresInstance {
    container: Option<ContainerAsync<GenericImage>>,
    host: String,
    port: u16,
    username: String,
    password: String,
    database: String,
}

impl std::fmt::Debug for PostgresInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresInstance")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("running", &self.is_running())
            .finish()
    }
}

impl PostgresInstance {
    /// Coordinates of this instance; the single source for every connection string
    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.container.is_some()
    }

    /// Stop and remove the container. A second call is a no-op.
    pub async fn stop(&mut self) -> FixtureResult<()> {
        let Some(container) = self.container.take() else {
            debug!("PostgreSQL container already stopped");
            return Ok(());
        };

        let result = container.stop().await;
        // Dropping the handle removes the container
        drop(container);

        match result {
            Ok(()) => {
                info!(port = self.port, "PostgreSQL container stopped");
                Ok(())
            }
            Err(e) => Err(FixtureError::Container(e)),
        }
    }

    /// Poll the administrative database until a connection succeeds or `deadline` passes.
    ///
    /// The image logs its ready message once for the bootstrap server and again for the
    /// real one, so the log wait alone is not enough.
    async fn wait_until_ready(&self, deadline: Instant, timeout: Duration) -> FixtureResult<()> {
        let url = self.descriptor().admin_connection_string();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Ok(attempt) = tokio::time::timeout(remaining, PgConnection::connect(&url)).await
            else {
                warn!(attempts = attempts, "PostgreSQL connection attempt outlived the deadline");
                return Err(FixtureError::ProvisioningTimeout { timeout });
            };

            match attempt {
                Ok(conn) => {
                    let _ = conn.close().await;
                    debug!(attempts = attempts, "PostgreSQL accepted connection");
                    return Ok(());
                }
                Err(e) => {
                    if Instant::now() + READINESS_POLL_INTERVAL >= deadline {
                        warn!(attempts = attempts, error = %e, "PostgreSQL never accepted a connection");
                        return Err(FixtureError::ProvisioningTimeout { timeout });
                    }
                    debug!(attempts = attempts, error = %e, "PostgreSQL not ready yet");
                    tokio::time::sleep(READINESS_POLL_INTERVAL).await;
                }
            }
        }
    }
}

/// Whether testcontainers gave up waiting for the container within its startup timeout
fn is_startup_timeout(error: &TestcontainersError) -> bool {
    matches!(
        error,
        TestcontainersError::WaitContainer(WaitContainerError::StartupTimeout)
    )
}
