//! Response construction for relayed streams.
//!
//! # Design Decisions
//! - Stream headers are set once, before the first body byte leaves
//! - Backend connect failures map to 502 Bad Gateway with a plain-text body
//! - Once streaming has started nothing is ever written besides backend lines

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Wrap a streaming body in an SSE response.
pub fn event_stream(body: Body) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

/// Single plain-text 502 sent when the backend cannot be reached.
pub fn bad_gateway(message: &'static str) -> Response {
    (StatusCode::BAD_GATEWAY, message).into_response()
}
