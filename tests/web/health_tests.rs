//! Health probes and cross-cutting middleware

use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;

use super::test_infrastructure::*;

#[tokio::test]
async fn test_health_endpoint() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_readiness_reports_unavailable_database() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    let response = server.get("/health/ready").await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_every_response_carries_request_id() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    let first = server.get("/health").await;
    let second = server.get("/api/v1/999").await;

    let first_id = first.header("x-request-id");
    let second_id = second.header("x-request-id");
    assert!(!first_id.is_empty());
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let server = build_server(Arc::new(InMemoryEmployeeService::new()));

    let response = server.get("/api/v2").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
