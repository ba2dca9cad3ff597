//! # Test Orchestration Lifecycle
//!
//! [`AppHostFixture`] owns one provisioned instance, its checkpoint baseline and one
//! application host for a whole test collection. It is passed explicitly to tests; there is
//! no process-wide instance.
//!
//! ```text
//! Uninitialized -> Provisioning -> SchemaReady -> BaselineCaptured -> HostRunning -> Stopped
//!                                                                       |    ^
//!                                                                       +----+ reset_between_tests
//! ```

use axum_test::TestServer;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::error;

use employee_api::logging::log_lifecycle_transition;

use crate::checkpoint::{self, Baseline, CheckpointOptions};
use crate::error::{FixtureError, FixturePhase, FixtureResult};
use crate::host::{AppHost, AppHostBuilder};
use crate::provisioner::{ConnectionDescriptor, PostgresContainer, PostgresInstance};
use crate::schema;

/// Initialization script shipped with this crate
pub fn default_script_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("scripts")
        .join("init_script.sql")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    Uninitialized,
    Provisioning,
    SchemaReady,
    BaselineCaptured,
    HostRunning,
    Stopped,
}

impl fmt::Display for FixtureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FixtureState::Uninitialized => "Uninitialized",
            FixtureState::Provisioning => "Provisioning",
            FixtureState::SchemaReady => "SchemaReady",
            FixtureState::BaselineCaptured => "BaselineCaptured",
            FixtureState::HostRunning => "HostRunning",
            FixtureState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Settings for one fixture
#[derive(Debug, Clone)]
pub struct FixtureOptions {
    pub container: PostgresContainer,
    pub script_path: PathBuf,
    pub checkpoint: CheckpointOptions,
    pub host: AppHostBuilder,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            container: PostgresContainer::new(),
            script_path: default_script_path(),
            checkpoint: CheckpointOptions::default(),
            host: AppHostBuilder::new(),
        }
    }
}

impl FixtureOptions {
    pub fn with_container(mut self, container: PostgresContainer) -> Self {
        self.container = container;
        self
    }

    pub fn with_script(mut self, script_path: impl Into<PathBuf>) -> Self {
        self.script_path = script_path.into();
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: CheckpointOptions) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn with_host(mut self, host: AppHostBuilder) -> Self {
        self.host = host;
        self
    }
}

/// Shared database and application host for a test collection
pub struct AppHostFixture {
    options: FixtureOptions,
    state: FixtureState,
    instance: Option<PostgresInstance>,
    descriptor: Option<ConnectionDescriptor>,
    baseline: Option<Baseline>,
    host: Option<AppHost>,
}

impl fmt::Debug for AppHostFixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppHostFixture")
            .field("state", &self.state)
            .field("descriptor", &self.descriptor)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl AppHostFixture {
    pub fn new(options: FixtureOptions) -> Self {
        Self {
            options,
            state: FixtureState::Uninitialized,
            instance: None,
            descriptor: None,
            baseline: None,
            host: None,
        }
    }

    /// Create and initialize in one step
    pub async fn start(options: FixtureOptions) -> FixtureResult<Self> {
        let mut fixture = Self::new(options);
        fixture.initialize().await?;
        Ok(fixture)
    }

    pub fn state(&self) -> FixtureState {
        self.state
    }

    /// Provision, initialize the schema, capture the baseline and start the host.
    ///
    /// On failure the container is stopped and the fixture ends in `Stopped`.
    pub async fn initialize(&mut self) -> FixtureResult<()> {
        if self.state != FixtureState::Uninitialized {
            return Err(self.invalid_state(FixturePhase::Provision, FixtureState::Uninitialized));
        }

        match self.run_initialization().await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(phase = %e.phase(), error = %e, "Fixture initialization failed");
                if let Err(stop_error) = self.stop_instance().await {
                    error!(error = %stop_error, "Failed to stop container after setup failure");
                }
                self.transition(FixtureState::Stopped, Some("initialization failed"));
                Err(e)
            }
        }
    }

    async fn run_initialization(&mut self) -> FixtureResult<()> {
        self.transition(FixtureState::Provisioning, None);
        let instance = self.options.container.start().await?;
        let descriptor = instance.descriptor();
        self.instance = Some(instance);
        self.descriptor = Some(descriptor.clone());

        schema::ensure_database(&descriptor).await?;
        schema::apply_script(&descriptor, &self.options.script_path).await?;
        self.transition(FixtureState::SchemaReady, None);

        let baseline = checkpoint::capture(&descriptor, &self.options.checkpoint).await?;
        self.baseline = Some(baseline);
        self.transition(FixtureState::BaselineCaptured, None);

        let host = self.options.host.clone().with_descriptor(&descriptor).start()?;
        self.host = Some(host);
        self.transition(FixtureState::HostRunning, None);

        Ok(())
    }

    /// Restore the baseline after a test. The host keeps running.
    pub async fn reset_between_tests(&self) -> FixtureResult<()> {
        let (descriptor, baseline) = match (&self.state, &self.descriptor, &self.baseline) {
            (FixtureState::HostRunning, Some(descriptor), Some(baseline)) => (descriptor, baseline),
            _ => return Err(self.invalid_state(FixturePhase::Reset, FixtureState::HostRunning)),
        };

        checkpoint::reset(descriptor, baseline).await
    }

    /// Drop the logical database and stop the container.
    ///
    /// The container is stopped even when earlier steps fail; the first error is returned.
    /// Calling this on a stopped fixture is a no-op.
    pub async fn teardown(&mut self) -> FixtureResult<()> {
        if self.state == FixtureState::Stopped {
            return Ok(());
        }

        let mut first_error: Option<FixtureError> = None;

        if let Some(host) = self.host.take() {
            host.shutdown().await;
        }

        if let (Some(descriptor), Some(instance)) = (&self.descriptor, &self.instance) {
            if instance.is_running() {
                if let Err(e) = schema::drop_database(descriptor).await {
                    error!(error = %e, "Failed to drop test database");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Err(e) = self.stop_instance().await {
            error!(error = %e, "Failed to stop container");
            first_error.get_or_insert(e);
        }

        self.baseline = None;
        self.transition(FixtureState::Stopped, None);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// HTTP client bound to the in-process application
    pub fn client(&self) -> FixtureResult<&TestServer> {
        self.running_host().map(AppHost::client)
    }

    /// Connection string the application host was configured with
    pub fn host_connection_string(&self) -> FixtureResult<&str> {
        self.running_host().map(AppHost::connection_string)
    }

    /// Coordinates shared by schema setup, checkpointing and the host
    pub fn descriptor(&self) -> Option<&ConnectionDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    fn running_host(&self) -> FixtureResult<&AppHost> {
        match (&self.state, &self.host) {
            (FixtureState::HostRunning, Some(host)) => Ok(host),
            _ => Err(self.invalid_state(FixturePhase::HostStart, FixtureState::HostRunning)),
        }
    }

    async fn stop_instance(&mut self) -> FixtureResult<()> {
        match self.instance.as_mut() {
            Some(instance) => instance.stop().await,
            None => Ok(()),
        }
    }

    fn transition(&mut self, to: FixtureState, details: Option<&str>) {
        let from = self.state;
        self.state = to;
        log_lifecycle_transition(
            "app_host_fixture",
            &from.to_string(),
            &to.to_string(),
            details,
        );
    }

    fn invalid_state(&self, phase: FixturePhase, expected: FixtureState) -> FixtureError {
        FixtureError::InvalidState {
            phase,
            state: self.state.to_string(),
            expected: expected.to_string(),
        }
    }
}
