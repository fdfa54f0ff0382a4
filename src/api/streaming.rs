//! Streaming utilities for Server-Sent Events (SSE)
//!
//! Frames research progress events as `data: <json>\n\n` and wraps the
//! stream in an HTTP response. The stream is pulled by the response body,
//! so a client disconnect drops the research run with it.

use crate::error::AppError;
use crate::orchestrator::types::ProgressEvent;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{stream::Stream, StreamExt};
use serde_json::json;

/// Encode one event as an SSE frame
pub fn sse_frame(event: &ProgressEvent) -> String {
    let payload = serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize progress event");
        json!({
            "type": "error",
            "message": format!("Failed to serialize progress event: {}", e),
            "data": null,
        })
        .to_string()
    });
    format!("data: {}\n\n", payload)
}

/// Create an SSE response from a stream of progress events
///
/// # Arguments
/// * `events` - Research progress events, in order
///
/// # Returns
/// * `Result<Response, AppError>` - SSE HTTP response or error
pub fn create_sse_response<S>(events: S) -> Result<Response, AppError>
where
    S: Stream<Item = ProgressEvent> + Send + 'static,
{
    let sse_stream = events.map(|event| Ok::<_, std::io::Error>(sse_frame(&event)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(sse_stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}
