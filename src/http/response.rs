//! HTTP response builders
//!
//! Builders never fail: a builder error is logged and replaced by an empty response
//! with the intended status.

use super::HttpResponse;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_LENGTH, CONTENT_TYPE, WWW_AUTHENTICATE};
use hyper::{Response, StatusCode};
use serde::Serialize;

const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json";

/// Plain-text response
pub fn text(status: StatusCode, body: impl Into<Bytes>) -> HttpResponse {
    let body = body.into();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT)
        .header(CONTENT_LENGTH, body.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| fallback(status, &e))
}

/// Serialize `value` as a JSON response body
pub fn json<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header(CONTENT_TYPE, JSON)
            .header(CONTENT_LENGTH, body.len())
            .body(Full::new(Bytes::from(body)))
            .unwrap_or_else(|e| fallback(status, &e)),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response body: {e}"));
            internal_error()
        }
    }
}

/// `{"message": ...}` JSON body, the shape the article API uses for errors
pub fn json_message(status: StatusCode, message: &str) -> HttpResponse {
    json(status, &serde_json::json!({ "message": message }))
}

/// Response with raw bytes and an explicit content type
pub fn bytes(status: StatusCode, content_type: &str, body: Bytes) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, body.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| fallback(status, &e))
}

/// 304 Not Modified
pub fn not_modified(etag: &str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| fallback(StatusCode::NOT_MODIFIED, &e))
}

/// 400 Bad Request
pub fn bad_request(message: &str) -> HttpResponse {
    json_message(StatusCode::BAD_REQUEST, message)
}

/// 401 Unauthorized with a Basic challenge
pub fn unauthorized(realm: &str, body: &'static str) -> HttpResponse {
    let challenge = format!("Basic realm=\"{}\"", realm.replace('"', "'"));
    let mut response = text(StatusCode::UNAUTHORIZED, body);
    match HeaderValue::from_str(&challenge) {
        Ok(value) => {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        Err(_) => {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
        }
    }
    response
}

/// 404 Not Found
pub fn not_found() -> HttpResponse {
    text(StatusCode::NOT_FOUND, "Sorry, that page doesn't exist.")
}

/// 405 Method Not Allowed
pub fn method_not_allowed(allow: &str) -> HttpResponse {
    let mut response = text(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    if let Ok(value) = HeaderValue::from_str(allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// 413 Payload Too Large
pub fn payload_too_large() -> HttpResponse {
    text(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// 500 Internal Server Error, deliberately free of detail
pub fn internal_error() -> HttpResponse {
    text(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// 504 Gateway Timeout
pub fn gateway_timeout() -> HttpResponse {
    text(StatusCode::GATEWAY_TIMEOUT, "504 Gateway Timeout")
}

fn fallback(status: StatusCode, error: &hyper::http::Error) -> HttpResponse {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
