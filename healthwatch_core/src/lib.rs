//! Health-check orchestration and reporting engine, plus the HTTP layer that
//! exposes it.
//!
//! ```text
//! Registry ──► HealthExecutor::run(predicate) ──► Report
//!                 (one task per check,             ├── ReadinessView / LivenessView / DashboardView
//!                  per-check timeout)              └── PublishQueue ──► Publisher ──► Sink
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod http_client;
pub mod metrics;
pub mod middleware;
pub mod publisher;

pub use crate::config::AppConfig;
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use health::{
    aggregate, build_registry, CheckContext, CheckDescriptor, CheckOutcome, CheckResult,
    DashboardView, HealthCheck, HealthExecutor, HealthStatus, LivenessView, ReadinessView,
    Registry, Report, TagPredicate,
};
pub use metrics::HealthMetrics;
pub use publisher::{
    sink_from_config, PublishOutcome, PublishQueue, PublishScheduler, Publisher, Sink,
};

use axum::Router;
use crate::config::{EndpointConfig, StatusCodeConfig};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub executor: HealthExecutor,
    pub ready_filter: TagPredicate,
    pub live_filter: TagPredicate,
    pub status_codes: StatusCodeConfig,
    pub metrics: HealthMetrics,
}

impl AppState {
    pub fn new(executor: HealthExecutor) -> Self {
        let endpoints = EndpointConfig::default();

        Self {
            app_name: "healthwatch".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            executor,
            ready_filter: endpoints.ready.predicate(),
            live_filter: endpoints.live.predicate(),
            status_codes: endpoints.status_codes,
            metrics: HealthMetrics::new(),
        }
    }

    pub fn from_registry(registry: Registry) -> Self {
        Self::new(HealthExecutor::new(Arc::new(registry)))
    }

    pub fn with_endpoints(mut self, endpoints: &EndpointConfig) -> Self {
        self.ready_filter = endpoints.ready.predicate();
        self.live_filter = endpoints.live.predicate();
        self.status_codes = endpoints.status_codes;
        self
    }

    pub fn with_metrics(mut self, metrics: HealthMetrics) -> Self {
        self.metrics = metrics;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    create_routes()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::logging::make_span)
                .on_response(middleware::logging::on_response)
                .on_failure(middleware::logging::on_failure),
        )
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
