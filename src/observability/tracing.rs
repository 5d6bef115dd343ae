//! Per-request spans.
//!
//! Every request gets a span carrying its `x-request-id`, so log lines from
//! the gateway and the portal client can be correlated.

use axum::{body::Body, http::Request};
use tracing::Span;

use crate::http::request::request_id;

/// Span factory for `TraceLayer::make_span_with`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request),
        method = %request.method(),
        path = %request.uri().path(),
    )
}
