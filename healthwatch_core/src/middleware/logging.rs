//! Request logging for the health endpoints
//!
//! Hooks for `tower_http::trace::TraceLayer`, wired up in [`crate::create_app`].

use axum::body::Body;
use http::{Request, Response, StatusCode};
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tracing::{info_span, Span};
use uuid::Uuid;

pub fn make_span(request: &Request<Body>) -> Span {
    info_span!(
        "http_request",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    )
}

pub fn on_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    let status = response.status();
    let latency_ms = latency.as_millis() as u64;

    if status.is_success() {
        tracing::info!(status = status.as_u16(), latency_ms, "request completed");
    } else if status == StatusCode::SERVICE_UNAVAILABLE
        || status == StatusCode::INTERNAL_SERVER_ERROR
    {
        // Degraded and unhealthy reports are answered with 5xx codes.
        tracing::warn!(status = status.as_u16(), latency_ms, "health report not healthy");
    } else {
        tracing::warn!(status = status.as_u16(), latency_ms, "client error response");
    }
}

pub fn on_failure(failure: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
    tracing::debug!(
        latency_ms = latency.as_millis() as u64,
        failure = %failure,
        "request classified as failure"
    );
}
