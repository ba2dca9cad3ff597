//! # Employee API Server
//!
//! ## Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin employee-api-server
//!
//! # Run against a specific environment file (config/production.toml)
//! EMPLOYEE_API_ENV=production cargo run --bin employee-api-server
//! ```

use tokio::signal;
use tracing::{error, info, warn};

use employee_api::config::ConfigLoader;
use employee_api::logging;
use employee_api::web::{create_app, state::AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_structured_logging();

    info!("Starting Employee API server");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let loader = ConfigLoader::new();
    info!("   Environment: {}", loader.environment());

    let config = loader.load().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    let state = AppState::from_config(&config)?;

    match state.database.health_check().await {
        Ok(_) => info!("Database reachable"),
        Err(e) => warn!(error = %e, "Database not reachable yet, serving anyway"),
    }

    let listener = tokio::net::TcpListener::bind(&config.web.bind_address).await?;
    info!(address = %listener.local_addr()?, "Web API listening");

    axum::serve(listener, create_app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown signal received, closing database pool");
    state.shutdown().await;
    info!("Employee API server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
