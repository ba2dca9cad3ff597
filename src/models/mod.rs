//! # Data Models
//!
//! Rows of the `employees` table and the request/response shapes the HTTP layer exchanges.

pub mod employee;

pub use employee::{CreateEmployeeRequest, Employee, EmployeeResponse, UpdateEmployeeRequest};
