//! Proxy handler: forwards the already-authenticated request's `Range`
//! header to the object store, maps the outcome onto the allowed response
//! status codes, and relays the body in the upstream's chunked stream.
//! Header lookups here are case-insensitive for free: `http::HeaderMap`
//! normalises header names internally, so `header::RANGE` matches `range`,
//! `Range`, or any other casing the client sent.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::objectstore::{ObjectBody, ObjectOutcome};
use crate::server::errors::ProxyError;
use crate::state::AppState;

/// Proxies a single gated GET to the object store. Also serves the
/// unauthenticated healthcheck path, which the auth middleware bypasses but
/// routes here unchanged — same key-building logic, same response shape.
pub async fn proxy_handler(State(app): State<Arc<AppState>>, req: Request<Body>) -> Response {
    let config = app.config();
    let path = req.uri().path();
    let key = format!("{}{}", config.key_prefix, path.trim_start_matches('/'));

    let range = req
        .headers()
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    match app.object_store().get_object(&key, range).await {
        ObjectOutcome::Found(body) => stream_response(body),
        ObjectOutcome::NotFound => ProxyError::NotFound.into_response(),
        ObjectOutcome::Error => ProxyError::Internal.into_response(),
    }
}

/// Builds the streaming 200/206 response, copying through only the
/// allowlisted response headers.
fn stream_response(body: ObjectBody) -> Response {
    let status = if body.is_range_response {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder().status(status);
    for (name, value) in [
        ("accept-ranges", body.accept_ranges.as_deref()),
        ("content-length", body.content_length.as_deref()),
        ("content-type", body.content_type.as_deref()),
        ("etag", body.etag.as_deref()),
        ("last-modified", body.last_modified.as_deref()),
        ("content-range", body.content_range.as_deref()),
    ] {
        if let Some(v) = value.and_then(|v| HeaderValue::from_str(v).ok()) {
            builder = builder.header(name, v);
        }
    }

    builder
        .body(Body::from_stream(body.stream))
        .expect("response with valid headers")
}
