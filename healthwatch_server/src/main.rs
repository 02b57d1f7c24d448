//! Main entry point for the health-check server binary

use anyhow::Result;
use healthwatch_core::{
    build_registry, create_app, run_server, sink_from_config, AppConfig, AppState, HealthExecutor,
    HealthMetrics, PublishQueue, PublishScheduler, Publisher, Sink,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let registry = build_registry(&config.health)
        .map_err(|e| anyhow::anyhow!("Failed to build health check registry: {}", e))?;
    let executor = HealthExecutor::new(Arc::new(registry))
        .with_default_timeout(config.health.default_timeout());
    let metrics = HealthMetrics::new();
    let shutdown = CancellationToken::new();

    let scheduler = if config.publisher.enabled {
        let sink = sink_from_config(&config.publisher.sink)
            .map_err(|e| anyhow::anyhow!("Failed to create publish sink: {}", e))?;
        info!("Publishing health reports to the '{}' sink", sink.name());

        let publisher = Publisher::new(sink)
            .with_format(config.publisher.format)
            .with_send_timeout(config.publisher.send_timeout())
            .with_metrics(metrics.clone());
        let (queue, _worker) = PublishQueue::start(publisher, config.publisher.queue_capacity);

        let handle = PublishScheduler::new(executor.clone(), queue)
            .with_predicate(config.publisher.filter.predicate())
            .with_delay(config.publisher.delay())
            .with_period(config.publisher.period())
            .with_metrics(metrics.clone())
            .spawn(shutdown.clone());
        Some(handle)
    } else {
        info!("Health report publishing disabled");
        None
    };

    let state = AppState::new(executor)
        .with_endpoints(&config.endpoints)
        .with_metrics(metrics);

    info!("App: {} v{}", state.app_name, state.version);

    let app = create_app(state);

    run_server(app, addr).await?;

    shutdown.cancel();
    if let Some(handle) = scheduler {
        if let Err(e) = handle.await {
            warn!("Publish scheduler did not stop cleanly: {}", e);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };

        format!(
            "healthwatch={level},healthwatch_core={level},tower_http=debug,sqlx=warn",
            level = default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
