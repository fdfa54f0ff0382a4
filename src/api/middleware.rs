//! Request correlation
//!
//! Every request runs inside a `request` span keyed by a request id. The id
//! is taken from an incoming `x-request-id` header when the client sends one
//! and echoed back on the response, so a research run's log lines can be
//! matched to the SSE stream that carried them.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Header carrying the request id in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied id that is accepted as is
const MAX_CLIENT_ID_LEN: usize = 128;

fn client_request_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_CLIENT_ID_LEN)
        .map(str::to_string)
}

/// Attach a request id, log completion with status and latency
pub async fn request_id(request: Request, next: Next) -> Response {
    let id = client_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let span = info_span!("request", request_id = %id, method = %method, path = %path);
    let mut response = next.run(request).instrument(span).await;

    // For SSE responses this is time to first byte, not the whole run
    info!(
        request_id = %id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );

    if let Ok(value) = HeaderValue::from_str(&id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}
