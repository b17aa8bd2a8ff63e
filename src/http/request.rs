//! Request correlation.
//!
//! Every request gets an `x-request-id` as early as possible: the caller's
//! own value is kept, otherwise a UUID is generated. The id is echoed on the
//! response and recorded on the request span.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Request};
use tracing::Span;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The request's correlation id, or `unknown` if none was assigned.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for one inbound request. The query string is left out, as it carries
/// the proxied target URL.
pub fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request.headers()),
        method = %request.method(),
        path = %request.uri().path(),
    )
}
