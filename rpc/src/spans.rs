//! Pre-built [`tracing::Span`] constructors for request handling.

use tracing::{info_span, Span};

/// Span covering one HTTP request from arrival to response.
pub fn request_span(method: &str, path: &str, request_id: &str) -> Span {
    info_span!("http_request", method = %method, path = %path, request_id = %request_id)
}

/// Span covering one caller-facing operation inside a request.
pub fn operation_span(operation: &'static str) -> Span {
    info_span!("operation", name = operation)
}
