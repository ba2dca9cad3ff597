//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to the console and, when the log
//! directory is writable, to a JSON file per process.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ConfigLoader;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigLoader::detect_environment();
        let log_level = get_log_level(&environment);

        let log_dir = PathBuf::from("log");
        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(env_filter(&log_level));

        let file_layer = match fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::never(&log_dir, &log_filename);
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                // The writer must outlive every span for the rest of the process
                std::mem::forget(guard);
                Some(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .with_ansi(false)
                        .json()
                        .with_filter(env_filter(&log_level)),
                )
            }
            Err(_) => None,
        };

        let file_enabled = file_layer.is_some();
        let subscriber = tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer);

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_dir.join(&log_filename).display(),
            file_enabled = file_enabled,
            "Structured logging initialized"
        );
    });
}

/// Subscriber for test binaries: output is captured by the test harness
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("debug"))
        .with_test_writer()
        .try_init();
}

/// `RUST_LOG` wins over the environment default
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for employee operations
pub fn log_employee_operation(
    operation: &str,
    employee_id: Option<i32>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        employee_id = employee_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "EMPLOYEE_OPERATION"
    );
}

/// Log a lifecycle state change of a long-lived component
pub fn log_lifecycle_transition(component: &str, from: &str, to: &str, details: Option<&str>) {
    tracing::info!(
        component = %component,
        from = %from,
        to = %to,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "LIFECYCLE_TRANSITION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_test_logging_is_repeatable() {
        init_test_logging();
        init_test_logging();
        log_employee_operation("list", None, "ok", None);
    }
}
