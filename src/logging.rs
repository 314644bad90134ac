//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The number of bytes of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest JSON request body that is read, matching axum's default body limit.
pub const MAX_JSON_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Fields whose values are never written to the logs.
const REDACTED_FIELDS: &[&str] = &["password"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged in full at the `debug` level.
///
/// Only JSON bodies are read. Password fields in JSON request bodies are
/// redacted, and other bodies (e.g. multipart photo uploads and uploaded
/// files) are passed through without being buffered. JSON request bodies
/// larger than [MAX_JSON_BODY_SIZE] are rejected with 413 Payload Too Large.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request = if is_json(request.headers()) {
        let (parts, body) = request.into_parts();
        let bytes = match axum::body::to_bytes(body, MAX_JSON_BODY_SIZE).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(
                    "Rejected request body for {} {}: {error}",
                    parts.method,
                    parts.uri
                );
                return StatusCode::PAYLOAD_TOO_LARGE.into_response();
            }
        };

        log_request(&parts, &redact_json(&bytes));
        Request::from_parts(parts, Body::from(bytes))
    } else {
        let (parts, body) = request.into_parts();
        log_request(&parts, "<not logged>");
        Request::from_parts(parts, body)
    };

    let response = next.run(request).await;

    if !is_json(response.headers()) {
        let (parts, body) = response.into_parts();
        log_response(&parts, "<not logged>");
        return Response::from_parts(parts, body);
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_response(&parts, &String::from_utf8_lossy(&bytes));

    Response::from_parts(parts, Body::from(bytes))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"))
}

/// Replace the values of [REDACTED_FIELDS] in a JSON object with asterisks.
///
/// Bodies that are not a JSON object are returned as-is.
fn redact_json(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut object)) => {
            for field in REDACTED_FIELDS {
                if let Some(value) = object.get_mut(*field) {
                    *value = Value::String("********".to_owned());
                }
            }

            Value::Object(object).to_string()
        }
        _ => String::from_utf8_lossy(body).to_string(),
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return body;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}
