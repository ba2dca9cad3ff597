//! # Employee Service
//!
//! ```text
//! Handler -> EmployeeService (trait) -> Employee model queries (DB)
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::models::employee::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest};

/// Errors that can occur during employee service operations.
#[derive(Error, Debug)]
pub enum EmployeeServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for employee service operations.
pub type EmployeeServiceResult<T> = Result<T, EmployeeServiceError>;

/// CRUD operations on employees.
///
/// Mutations report whether at least one row was affected; callers map `false` to the
/// appropriate HTTP status.
#[async_trait]
pub trait EmployeeService: Send + Sync {
    async fn list(&self) -> EmployeeServiceResult<Vec<Employee>>;

    async fn find_by_id(&self, id: i32) -> EmployeeServiceResult<Option<Employee>>;

    async fn create(&self, request: &CreateEmployeeRequest) -> EmployeeServiceResult<bool>;

    async fn update(&self, request: &UpdateEmployeeRequest) -> EmployeeServiceResult<bool>;

    async fn delete(&self, id: i32) -> EmployeeServiceResult<bool>;
}

/// PostgreSQL-backed [`EmployeeService`]
#[derive(Clone)]
pub struct PgEmployeeService {
    pool: PgPool,
}

impl std::fmt::Debug for PgEmployeeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgEmployeeService")
            .field("pool", &"PgPool")
            .finish()
    }
}

impl PgEmployeeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeService for PgEmployeeService {
    async fn list(&self) -> EmployeeServiceResult<Vec<Employee>> {
        let employees = Employee::list(&self.pool).await?;
        debug!(count = employees.len(), "Listed employees");
        Ok(employees)
    }

    async fn find_by_id(&self, id: i32) -> EmployeeServiceResult<Option<Employee>> {
        Ok(Employee::find_by_id(&self.pool, id).await?)
    }

    async fn create(&self, request: &CreateEmployeeRequest) -> EmployeeServiceResult<bool> {
        let rows = Employee::create(&self.pool, request).await?;
        Ok(rows > 0)
    }

    async fn update(&self, request: &UpdateEmployeeRequest) -> EmployeeServiceResult<bool> {
        let rows = Employee::update(&self.pool, request).await?;
        Ok(rows > 0)
    }

    async fn delete(&self, id: i32) -> EmployeeServiceResult<bool> {
        let rows = Employee::delete(&self.pool, id).await?;
        Ok(rows > 0)
    }
}
