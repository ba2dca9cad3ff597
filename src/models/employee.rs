use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Employee record
/// Maps to `employees` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub position: String,
    pub salary: f64,
}

/// Body of `POST /api/v1`
///
/// Absent fields deserialize as blank/zero so they fail [`CreateEmployeeRequest::is_valid`]
/// instead of being rejected by the JSON extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub email: String,
    pub position: String,
    pub salary: f64,
}

/// Body of `PUT /api/v1/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UpdateEmployeeRequest {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub position: String,
    pub salary: f64,
}

/// Employee as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeeResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub position: String,
    pub salary: f64,
}

impl CreateEmployeeRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        position: impl Into<String>,
        salary: f64,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            position: position.into(),
            salary,
        }
    }

    /// Name, email and position present and a positive salary
    pub fn is_valid(&self) -> bool {
        !is_blank(&self.name) && !is_blank(&self.email) && !is_blank(&self.position) && self.salary > 0.0
    }
}

impl UpdateEmployeeRequest {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        email: impl Into<String>,
        position: impl Into<String>,
        salary: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            position: position.into(),
            salary,
        }
    }

    /// Name, email and position present and the body targets `path_id`
    pub fn is_valid_for(&self, path_id: i32) -> bool {
        !is_blank(&self.name) && !is_blank(&self.email) && !is_blank(&self.position) && self.id == path_id
    }
}

impl From<Employee> for EmployeeResponse {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            position: employee.position,
            salary: employee.salary,
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl Employee {
    /// All employees ordered by id
    pub async fn list(pool: &PgPool) -> Result<Vec<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, email, position, salary
            FROM employees
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Find an employee by ID
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Employee>, sqlx::Error> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, email, position, salary
            FROM employees
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Insert a new employee, returning the number of rows written
    pub async fn create(pool: &PgPool, request: &CreateEmployeeRequest) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, email, position, salary)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.position)
        .bind(request.salary)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Overwrite every column of the employee named by `request.id`
    pub async fn update(pool: &PgPool, request: &UpdateEmployeeRequest) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET name = $2, email = $3, position = $4, salary = $5
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.position)
        .bind(request.salary)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
