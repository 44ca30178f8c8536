//! Health check handlers

use axum::{http::StatusCode, Json};
use serde_json::json;

/// Liveness check
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
