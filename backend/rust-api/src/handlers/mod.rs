use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::db;
use crate::metrics;
use crate::services::AppState;

pub mod exam;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match tokio::time::timeout(
        std::time::Duration::from_secs(1),
        db::ping(&state.pool),
    )
    .await
    {
        Ok(Ok(())) => json!({ "status": "healthy" }),
        Ok(Err(e)) => json!({ "status": "unhealthy", "error": format!("LMS database error: {}", e) }),
        Err(_) => json!({ "status": "unhealthy", "error": "LMS database timeout after 1s" }),
    };

    let healthy = database.get("status").and_then(|v| v.as_str()) == Some("healthy");
    let (status_code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": state.config.app_name,
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "question_cache_entries": state.exam.cache().entry_count(),
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}
