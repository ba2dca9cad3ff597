//! Configuration Loader
//!
//! Environment-aware loader that merges TOML files, environment variables and explicit
//! overrides into an [`AppConfig`].

use super::error::ConfigResult;
use super::{redact_url, AppConfig};
use config::{Config, Environment, File, Map};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration key the application reads its database connection string from
pub const DEFAULT_CONNECTION_KEY: &str = "connection_strings.default_connection";

/// Prefix for environment variable overrides, e.g.
/// `EMPLOYEE_API__CONNECTION_STRINGS__DEFAULT_CONNECTION`
pub const ENV_PREFIX: &str = "EMPLOYEE_API";

/// Builder-style loader for [`AppConfig`].
///
/// ## Precedence
///
/// Sources are consulted in this order and later sources win:
///
/// 1. serde defaults on [`AppConfig`]
/// 2. `{config_dir}/default.toml` (optional)
/// 3. `{config_dir}/{environment}.toml` (optional)
/// 4. `EMPLOYEE_API__*` environment variables
/// 5. overrides registered with [`ConfigLoader::with_override`], in registration order
///
/// Overrides are always the last source consulted, so a value injected here cannot be
/// shadowed by a file or environment variable.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    environment: String,
    config_dir: PathBuf,
    env_source: Option<Map<String, String>>,
    overrides: Vec<(String, String)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader for the detected environment reading from `EMPLOYEE_API_CONFIG_DIR` or `./config`
    pub fn new() -> Self {
        let config_dir = env::var("EMPLOYEE_API_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        Self {
            environment: Self::detect_environment(),
            config_dir,
            env_source: None,
            overrides: Vec::new(),
        }
    }

    /// Detect environment from `EMPLOYEE_API_ENV`, then `APP_ENV`, defaulting to "development"
    pub fn detect_environment() -> String {
        env::var("EMPLOYEE_API_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = config_dir.into();
        self
    }

    /// Read environment overrides from `vars` instead of the process environment
    pub fn with_env_source(mut self, vars: Map<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// Register an override applied after every other source.
    ///
    /// Overrides registered later win over earlier ones for the same key.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Merge all sources and validate the result
    pub fn load(&self) -> ConfigResult<AppConfig> {
        if self.env_source.is_none() {
            dotenvy::dotenv().ok();
        }

        debug!(
            environment = %self.environment,
            config_dir = %self.config_dir.display(),
            overrides = self.overrides.len(),
            "Loading configuration"
        );

        let default_file = self.config_dir.join("default");
        let environment_file = self.config_dir.join(&self.environment);

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(self.env_source.clone());

        let mut builder = Config::builder()
            .add_source(File::with_name(&default_file.to_string_lossy()).required(false))
            .add_source(File::with_name(&environment_file.to_string_lossy()).required(false))
            .add_source(environment);

        for (key, value) in &self.overrides {
            builder = builder.set_override(key.as_str(), value.as_str())?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            environment = %self.environment,
            database_url = %config
                .connection_strings
                .default_connection
                .as_deref()
                .map(redact_url)
                .unwrap_or_else(|| "[UNSET]".to_string()),
            bind_address = %config.web.bind_address,
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}
