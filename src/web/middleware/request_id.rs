//! # Request ID Middleware
//!
//! Tags every request with an identifier for log correlation.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

/// Response header carrying the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate a request ID, expose it to handlers through request extensions and echo it in
/// the `x-request-id` response header.
pub async fn add_request_id(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = tracing::debug_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri()
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Request ID wrapper for extension storage
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_as_str() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = RequestId(uuid_str.to_string());
        assert_eq!(id.as_str(), uuid_str);
    }

    #[test]
    fn test_generated_ids_are_valid_header_values() {
        let id = Uuid::new_v4().to_string();
        assert!(HeaderValue::from_str(&id).is_ok());
    }
}
