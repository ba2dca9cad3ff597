#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Employee API
//!
//! Small HTTP service exposing CRUD operations on a single `employees` table.
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration loading (files, environment, overrides)
//! - [`database`] - Connection pool construction
//! - [`error`] - Application-level error type
//! - [`logging`] - Structured logging setup
//! - [`models`] - Employee record and request/response shapes
//! - [`services`] - Employee data access behind the [`services::EmployeeService`] trait
//! - [`web`] - Axum router, handlers, middleware and shared state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use employee_api::config::ConfigLoader;
//! use employee_api::web::{create_app, state::AppState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! let state = AppState::from_config(&config)?;
//! let app = create_app(state);
//!
//! let listener = tokio::net::TcpListener::bind(&config.web.bind_address).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Handler tests run against an in-memory service. Tests that need a real database live in
//! the `employee-fixture` workspace member and require Docker:
//!
//! ```bash
//! cargo test                        # Unit tests
//! cargo test -p employee-fixture -- --ignored   # Docker-backed integration tests
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod web;

pub use config::{AppConfig, ConfigLoader, ConfigurationError};
pub use error::{AppError, Result};
pub use models::employee::{CreateEmployeeRequest, Employee, EmployeeResponse, UpdateEmployeeRequest};
