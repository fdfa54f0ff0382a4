//! Root and health check endpoints

use axum::Json;
use serde::Serialize;

/// Root response
#[derive(Serialize)]
pub struct HelloResponse {
    /// Greeting
    pub message: String,
    /// Always "ok"
    pub status: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always "healthy"
    pub status: String,
    /// Service name
    pub service: String,
    /// Current time, RFC 3339
    pub timestamp: String,
}

/// Handler for GET /
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Deep Research Backend is running".to_string(),
        status: "ok".to_string(),
    })
}

/// Handler for GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "deep-research-backend".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
