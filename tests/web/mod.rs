//! # Web API Integration Tests
//!
//! - Employee CRUD endpoint behavior
//! - Health probes and middleware

pub mod employee_endpoint_tests;
pub mod health_tests;
pub mod test_infrastructure;
