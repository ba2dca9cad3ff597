//! # Ephemeral Database Provisioner
//!
//! Starts a disposable PostgreSQL container on a host port chosen by Docker and exposes the
//! coordinates every other fixture component connects with.
//!
//! ```rust,no_run
//! use employee_fixture::provisioner::PostgresContainer;
//!
//! # async fn example() -> employee_fixture::FixtureResult<()> {
//! let mut instance = PostgresContainer::new().with_database("testdb").start().await?;
//! let url = instance.descriptor().connection_string();
//! instance.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod postgres_container;

pub use descriptor::ConnectionDescriptor;
pub use postgres_container::{PostgresContainer, PostgresInstance};
