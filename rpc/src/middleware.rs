//! Request id tagging.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

use crate::spans::request_span;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Run the request inside an `http_request` span with a fresh request id and
/// echo the id back as `X-Request-ID`.
pub async fn request_id(req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    let span = request_span(req.method().as_str(), req.uri().path(), &id);

    let mut response = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| tracing::debug!(status = response.status().as_u16(), "request done"));

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
