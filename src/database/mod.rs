//! # Database Layer
//!
//! Connection pool construction for the employee store.
//!
//! The pool is created lazily: building the application never opens a connection, the
//! first request does. A wrong or unreachable connection string therefore surfaces as a
//! failed request rather than a silent fallback to another database.

pub mod connection;

pub use connection::DatabaseConnection;
