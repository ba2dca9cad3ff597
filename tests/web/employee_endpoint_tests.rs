//! Employee CRUD endpoints

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;

use employee_api::EmployeeResponse;

use super::test_infrastructure::*;

fn john() -> Value {
    json!({
        "Name": "John Doe",
        "Email": "john.doe@example.com",
        "Position": "Developer",
        "Salary": 60000
    })
}

#[tokio::test]
async fn test_list_is_empty_initially() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    let response = server.get("/api/v1").await;

    response.assert_status_ok();
    let employees: Vec<EmployeeResponse> = response.json();
    assert!(employees.is_empty());
}

#[tokio::test]
async fn test_create_then_list() {
    let service = Arc::new(InMemoryEmployeeService::new());
    let server = build_server(service.clone());

    let created = server.post("/api/v1").json(&john()).await;
    created.assert_status_ok();
    let body: Value = created.json();
    assert_eq!(body, json!(true));

    let listed: Vec<Value> = server.get("/api/v1").await.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["Name"], "John Doe");
    assert_eq!(listed[0]["Email"], "john.doe@example.com");
    assert_eq!(listed[0]["Position"], "Developer");
    assert_eq!(listed[0]["Salary"], 60000.0);
    assert!(listed[0]["Id"].is_i64());
}

#[tokio::test]
async fn test_list_is_ordered_by_id() {
    let service = Arc::new(InMemoryEmployeeService::new());
    let first = service.seed("A", "a@example.com", "Dev", 1.0);
    let second = service.seed("B", "b@example.com", "Dev", 2.0);
    let server = build_server(service);

    let employees: Vec<EmployeeResponse> = server.get("/api/v1").await.json();

    let ids: Vec<i32> = employees.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn test_get_by_id() {
    let service = Arc::new(InMemoryEmployeeService::new());
    let id = service.seed("Jane Doe", "jane.doe@example.com", "Designer", 55000.0);
    let server = build_server(service);

    let response = server.get(&format!("/api/v1/{id}")).await;

    response.assert_status_ok();
    let employee: EmployeeResponse = response.json();
    assert_eq!(employee.id, id);
    assert_eq!(employee.name, "Jane Doe");
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    let response = server.get("/api/v1/999").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_rejects_invalid_data() {
    let service = Arc::new(InMemoryEmployeeService::new());
    let server = build_server(service.clone());

    let invalid = [
        json!({ "Name": "", "Email": "e@example.com", "Position": "Dev", "Salary": 10 }),
        json!({ "Name": "N", "Email": "", "Position": "Dev", "Salary": 10 }),
        json!({ "Name": "N", "Email": "e@example.com", "Position": "", "Salary": 10 }),
        json!({ "Name": "N", "Email": "e@example.com", "Position": "Dev", "Salary": 0 }),
        json!({ "Name": "N", "Email": "e@example.com", "Position": "Dev", "Salary": -1 }),
        json!({}),
    ];

    for body in invalid {
        let response = server.post("/api/v1").json(&body).await;
        assert_eq!(
            response.status_code(),
            StatusCode::BAD_REQUEST,
            "body {body} should be rejected"
        );
        let error: Value = response.json();
        assert_eq!(error["error"]["message"], "Invalid employee data.");
    }

    assert_eq!(service.len(), 0);
}

#[tokio::test]
async fn test_create_reports_failed_insert() {
    let server = build_server(Arc::new(InMemoryEmployeeService::rejecting_inserts()));

    let response = server.post("/api/v1").json(&john()).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = response.json();
    assert_eq!(
        error["error"]["message"],
        "A problem happened while handling your request."
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    let response = server
        .post("/api/v1")
        .text("{\"Name\": ")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    for response in [
        server.get("/api/v1/abc").await,
        server.delete("/api/v1/abc").await,
        server.put("/api/v1/abc").json(&john()).await,
    ] {
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_update_existing_employee() {
    let service = Arc::new(InMemoryEmployeeService::new());
    let id = service.seed("John Doe", "john.doe@example.com", "Developer", 60000.0);
    let server = build_server(service);

    let response = server
        .put(&format!("/api/v1/{id}"))
        .json(&json!({
            "Id": id,
            "Name": "John Doe",
            "Email": "john.doe@example.com",
            "Position": "Lead",
            "Salary": 70000
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let employee: EmployeeResponse = server.get(&format!("/api/v1/{id}")).await.json();
    assert_eq!(employee.position, "Lead");
    assert_eq!(employee.salary, 70000.0);
}

#[tokio::test]
async fn test_update_with_mismatched_id_is_bad_request() {
    let service = Arc::new(InMemoryEmployeeService::new());
    let id = service.seed("John Doe", "john.doe@example.com", "Developer", 60000.0);
    let server = build_server(service);

    let response = server
        .put(&format!("/api/v1/{id}"))
        .json(&json!({
            "Id": id + 1,
            "Name": "John Doe",
            "Email": "john.doe@example.com",
            "Position": "Lead",
            "Salary": 70000
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_missing_employee_is_not_found() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    let response = server
        .put("/api/v1/42")
        .json(&json!({
            "Id": 42,
            "Name": "Ghost",
            "Email": "ghost@example.com",
            "Position": "None",
            "Salary": 1
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_existing_then_missing() {
    let service = Arc::new(InMemoryEmployeeService::new());
    let id = service.seed("John Doe", "john.doe@example.com", "Developer", 60000.0);
    let server = build_server(service.clone());

    let deleted = server.delete(&format!("/api/v1/{id}")).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
    assert_eq!(service.len(), 0);

    let again = server.delete(&format!("/api/v1/{id}")).await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
}
