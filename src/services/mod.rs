//! # Services
//!
//! Business-facing operations the HTTP handlers call. Each operation is one parameterized
//! statement; the trait exists so handlers can be exercised without a database.

pub mod employee_service;

pub use employee_service::{
    EmployeeService, EmployeeServiceError, EmployeeServiceResult, PgEmployeeService,
};
