//! # Employee Handlers
//!
//! CRUD endpoints under `/api/v1`. Handlers validate input, delegate to the
//! [`EmployeeService`](crate::services::EmployeeService) held in [`AppState`] and map the
//! outcome to a status code.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};

use crate::logging::log_employee_operation;
use crate::models::employee::{CreateEmployeeRequest, EmployeeResponse, UpdateEmployeeRequest};
use crate::web::errors::{ApiError, ApiResult, WRITE_FAILED_MESSAGE};
use crate::web::state::AppState;

const INVALID_EMPLOYEE_MESSAGE: &str = "Invalid employee data.";

/// List employees: GET /api/v1
pub async fn list_employees(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<EmployeeResponse>>> {
    let employees = state.employee_service.list().await?;
    Ok(Json(
        employees.into_iter().map(EmployeeResponse::from).collect(),
    ))
}

/// Get a single employee: GET /api/v1/:id
pub async fn get_employee(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<EmployeeResponse>> {
    let Path(id) = path?;
    match state.employee_service.find_by_id(id).await? {
        Some(employee) => Ok(Json(employee.into())),
        None => Err(ApiError::not_found(format!("Employee {id} not found"))),
    }
}

/// Create an employee: POST /api/v1
///
/// Responds with a bare `true` body on success.
pub async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<CreateEmployeeRequest>, JsonRejection>,
) -> ApiResult<Json<bool>> {
    let Json(request) = payload?;

    if !request.is_valid() {
        warn!(name = %request.name, "Rejected invalid employee");
        return Err(ApiError::bad_request(INVALID_EMPLOYEE_MESSAGE));
    }

    if !state.employee_service.create(&request).await? {
        log_employee_operation("create", None, "failed", Some("no rows inserted"));
        return Err(ApiError::internal(WRITE_FAILED_MESSAGE));
    }

    info!(name = %request.name, "Employee created");
    log_employee_operation("create", None, "ok", None);
    Ok(Json(true))
}

/// Update an employee: PUT /api/v1/:id
///
/// The body's `Id` must match the path.
pub async fn update_employee(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateEmployeeRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    let Json(request) = payload?;

    if !request.is_valid_for(id) {
        warn!(path_id = id, body_id = request.id, "Rejected invalid employee update");
        return Err(ApiError::bad_request(INVALID_EMPLOYEE_MESSAGE));
    }

    if !state.employee_service.update(&request).await? {
        return Err(ApiError::not_found(format!("Employee {id} not found")));
    }

    log_employee_operation("update", Some(id), "ok", None);
    Ok(StatusCode::NO_CONTENT)
}

/// Delete an employee: DELETE /api/v1/:id
pub async fn delete_employee(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    if !state.employee_service.delete(id).await? {
        return Err(ApiError::not_found(format!("Employee {id} not found")));
    }

    log_employee_operation("delete", Some(id), "ok", None);
    Ok(StatusCode::NO_CONTENT)
}
