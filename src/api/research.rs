//! Research API handlers
//!
//! `POST /api/research` starts a run and either streams progress as SSE or
//! returns every event at once. History and status endpoints read the shared
//! in-memory store.

use crate::api::streaming::create_sse_response;
use crate::api::utils::validate_query;
use crate::config::ConfigReadiness;
use crate::error::AppError;
use crate::orchestrator::types::{ProgressEvent, ResearchRecord};
use crate::orchestrator::utils::hash_query;
use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Research request body
#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    /// Research question
    pub query: String,
    /// Stream progress as SSE (default) or return all events at once
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Non-streaming research response
#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    /// The research query
    pub query: String,
    /// Always "completed"
    pub status: String,
    /// Collected events
    pub data: ResearchUpdates,
}

/// Every event of a run, in order
#[derive(Debug, Serialize)]
pub struct ResearchUpdates {
    /// Progress events
    pub updates: Vec<ProgressEvent>,
}

/// History listing
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Records in completion order
    pub history: Vec<ResearchRecord>,
    /// Number of records
    pub total: usize,
}

/// History clear confirmation
#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    /// Confirmation message
    pub message: String,
    /// Number of records removed
    pub cleared: usize,
}

/// Service status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always "ready"
    pub status: String,
    /// Completed runs
    pub steps: Vec<ResearchRecord>,
    /// Human-readable summary
    pub message: String,
    /// Credential status of external services
    pub config: ConfigReadiness,
}

/// Handler for POST /api/research
///
/// # Returns
/// * `Ok(Response)` - SSE stream, or the JSON body with all events
/// * `Err(AppError)` - If the query is empty or too long
pub async fn start_research(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResearchRequest>,
) -> Result<Response, AppError> {
    let query = validate_query(&request.query)?.to_string();
    let stream = request.stream.unwrap_or(true);

    tracing::info!(
        query_hash = %hash_query(&query),
        query_len = query.len(),
        stream = stream,
        "Research request received"
    );

    let events = state.orchestrator.clone().run(query.clone());
    if stream {
        return create_sse_response(events);
    }

    let updates: Vec<ProgressEvent> = events.collect().await;
    Ok(Json(ResearchResponse {
        query,
        status: "completed".to_string(),
        data: ResearchUpdates { updates },
    })
    .into_response())
}

/// Handler for GET /api/research/history
pub async fn get_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HistoryResponse>, AppError> {
    let history = state.history().list()?;
    Ok(Json(HistoryResponse {
        total: history.len(),
        history,
    }))
}

/// Handler for DELETE /api/research/history
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearHistoryResponse>, AppError> {
    let cleared = state.history().clear()?;
    tracing::info!(cleared = cleared, "Research history cleared");
    Ok(Json(ClearHistoryResponse {
        message: "Research history cleared".to_string(),
        cleared,
    }))
}

/// Handler for GET /api/research/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, AppError> {
    let steps = state.history().list()?;
    let message = if state.readiness.deepseek {
        format!("Research service ready, {} completed runs", steps.len())
    } else {
        format!(
            "Research service ready without a DeepSeek API key (default plans and fallback reports only), {} completed runs",
            steps.len()
        )
    };
    Ok(Json(StatusResponse {
        status: "ready".to_string(),
        steps,
        message,
        config: state.readiness.clone(),
    }))
}
