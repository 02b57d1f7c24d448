//! Health endpoints: each request runs one cycle and renders it for its audience

use crate::{
    error::{AppError, Result},
    health::{DashboardView, EntryView, LivenessView, ReadinessView, Report, TagPredicate},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::info;

async fn run_cycle(state: &AppState, predicate: &TagPredicate) -> Report {
    let report = state.executor.run(predicate).await;
    state.metrics.record_cycle(
        report.overall_status(),
        report.total_duration().as_millis() as u64,
    );
    report
}

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /health - Running all health checks");

    let report = run_cycle(&state, &TagPredicate::All).await;
    let status_code = state.status_codes.status_code(report.overall_status());

    (status_code, Json(ReadinessView::from(&report)))
}

pub async fn handle_readiness(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /health/ready - Readiness probe");

    let report = run_cycle(&state, &state.ready_filter).await;
    let status_code = state.status_codes.status_code(report.overall_status());

    (status_code, Json(ReadinessView::from(&report)))
}

pub async fn handle_liveness(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /health/live - Liveness probe");

    let report = run_cycle(&state, &state.live_filter).await;
    let status_code = state.status_codes.status_code(report.overall_status());

    (status_code, Json(LivenessView::from(&report)))
}

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /health/dashboard - Dashboard view");

    let report = run_cycle(&state, &TagPredicate::All).await;
    let status_code = state.status_codes.status_code(report.overall_status());

    (status_code, Json(DashboardView::from(&report)))
}

pub async fn handle_check(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    info!("GET /health/checks/{} - Checking specific component", name);

    let result = state
        .executor
        .run_one(&name)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Health check '{}' not found", name)))?;
    let status_code = state.status_codes.status_code(result.status);

    Ok((status_code, Json(EntryView::from(&result))))
}

pub async fn handle_metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}
