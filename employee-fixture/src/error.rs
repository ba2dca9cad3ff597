//! Fixture error taxonomy
//!
//! Every failure names the lifecycle phase it happened in. Nothing here is retried.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Lifecycle phase a [`FixtureError`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixturePhase {
    Provision,
    Init,
    Capture,
    HostStart,
    Reset,
    Teardown,
}

impl fmt::Display for FixturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FixturePhase::Provision => "provision",
            FixturePhase::Init => "init",
            FixturePhase::Capture => "capture",
            FixturePhase::HostStart => "host-start",
            FixturePhase::Reset => "reset",
            FixturePhase::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("[provision] database did not accept connections within {timeout:?}")]
    ProvisioningTimeout { timeout: Duration },

    #[error("[provision] container runtime error: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("[init] initialization script not found: {}", path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("[init] failed to read initialization script {}: {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[init] failed to create database '{database}': {source}")]
    DatabaseCreationFailure {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("[init] initialization script {} failed: {source}", path.display())]
    ScriptExecution {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("[capture] schema introspection failed: {0}")]
    Capture(#[source] sqlx::Error),

    #[error("[reset] failed to clear table '{table}': {source}")]
    ResetFailure {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("[host-start] connection string for '{key}' is missing or empty")]
    MissingConnectionString { key: String },

    #[error("[host-start] application host failed to start: {0}")]
    HostStart(String),

    #[error("[teardown] {0}")]
    Teardown(String),

    #[error("[{phase}] fixture is {state}, expected {expected}")]
    InvalidState {
        phase: FixturePhase,
        state: String,
        expected: String,
    },
}

impl FixtureError {
    /// Phase the failure occurred in
    pub fn phase(&self) -> FixturePhase {
        match self {
            FixtureError::ProvisioningTimeout { .. } | FixtureError::Container(_) => {
                FixturePhase::Provision
            }
            FixtureError::ScriptNotFound { .. }
            | FixtureError::ScriptRead { .. }
            | FixtureError::DatabaseCreationFailure { .. }
            | FixtureError::ScriptExecution { .. } => FixturePhase::Init,
            FixtureError::Capture(_) => FixturePhase::Capture,
            FixtureError::ResetFailure { .. } => FixturePhase::Reset,
            FixtureError::MissingConnectionString { .. } | FixtureError::HostStart(_) => {
                FixturePhase::HostStart
            }
            FixtureError::Teardown(_) => FixturePhase::Teardown,
            FixtureError::InvalidState { phase, .. } => *phase,
        }
    }
}

pub type FixtureResult<T> = Result<T, FixtureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_phase() {
        let err = FixtureError::ScriptNotFound {
            path: PathBuf::from("scripts/missing.sql"),
        };
        assert_eq!(err.phase(), FixturePhase::Init);
        assert!(err.to_string().starts_with("[init]"));
        assert!(err.to_string().contains("scripts/missing.sql"));

        let err = FixtureError::ResetFailure {
            table: "public.employees".to_string(),
            source: sqlx::Error::PoolTimedOut,
        };
        assert_eq!(err.phase(), FixturePhase::Reset);
        assert!(err.to_string().contains("public.employees"));

        let err = FixtureError::MissingConnectionString {
            key: "connection_strings.default_connection".to_string(),
        };
        assert_eq!(err.phase(), FixturePhase::HostStart);
        assert!(err.to_string().starts_with("[host-start]"));
    }

    #[test]
    fn test_provisioning_timeout_phase() {
        let err = FixtureError::ProvisioningTimeout {
            timeout: Duration::from_secs(60),
        };
        assert_eq!(err.phase(), FixturePhase::Provision);
        assert_eq!(FixturePhase::HostStart.to_string(), "host-start");
    }
}
