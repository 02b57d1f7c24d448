//! Route table for the health endpoints

use crate::AppState;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use super::health::{
    handle_check, handle_dashboard, handle_health, handle_liveness, handle_metrics,
    handle_readiness,
};

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/health/ready", get(handle_readiness))
        .route("/health/live", get(handle_liveness))
        .route("/health/dashboard", get(handle_dashboard))
        .route("/health/checks/:name", get(handle_check))
        .route("/health/metrics", get(handle_metrics))
}

async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "app": state.app_name,
        "version": state.version,
        "checks": state.executor.registry().names(),
        "endpoints": {
            "health": "/health",
            "ready": "/health/ready",
            "live": "/health/live",
            "dashboard": "/health/dashboard",
            "check": "/health/checks/{name}",
            "metrics": "/health/metrics"
        }
    }))
}
