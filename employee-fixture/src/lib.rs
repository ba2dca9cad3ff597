//! # Employee Fixture
//!
//! Integration-test fixture for the Employee API: a disposable PostgreSQL container, schema
//! setup from an init script, a checkpoint that resets data between tests, and the API
//! hosted in-process behind an HTTP test client.
//!
//! ## Lifecycle
//!
//! ```text
//! PostgresContainer::start ─▶ schema::ensure_database ─▶ schema::apply_script
//!        ─▶ checkpoint::capture ─▶ AppHostBuilder::start ─▶ tests
//!                                                  ▲            │
//!                                                  └─ reset ◀───┘
//! teardown: drop database, stop container
//! ```
//!
//! [`AppHostFixture`] drives that sequence; [`TestCollection`] runs cases against it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use employee_fixture::{AppHostFixture, FixtureOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//!     let mut fixture = AppHostFixture::start(FixtureOptions::default()).await?;
//!
//!     fixture.client()?.get("/api/v1").await.assert_status_ok();
//!
//!     fixture.reset_between_tests().await?;
//!     fixture.teardown().await?;
//! #     Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod collection;
pub mod error;
pub mod fixture;
pub mod host;
pub mod provisioner;
pub mod schema;

pub use checkpoint::{Baseline, CheckpointOptions, DeleteOrder, ForeignKey, TableName};
pub use collection::{CaseFn, CaseOutcome, CollectionReport, TestCollection};
pub use error::{FixtureError, FixturePhase, FixtureResult};
pub use fixture::{default_script_path, AppHostFixture, FixtureOptions, FixtureState};
pub use host::{AppHost, AppHostBuilder};
pub use provisioner::{ConnectionDescriptor, PostgresContainer, PostgresInstance};
