//! Asynchronous, best-effort forwarding of reports to a sink
//!
//! ```text
//! PublishScheduler (periodic cycle)
//!   └── HealthExecutor::run → Arc<Report>
//!         └── PublishQueue::submit (bounded, never blocks)
//!               └── worker task → Publisher::publish → Sink::send (one attempt)
//! ```
//!
//! A failed publish is logged, counted and dropped; the next cycle's report
//! supersedes it.

pub mod queue;
pub mod scheduler;
pub mod sink;

pub use queue::PublishQueue;
pub use scheduler::PublishScheduler;
pub use sink::{sink_from_config, ChannelSink, EncodedMessage, HttpSink, LogSink, Sink};

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mime::Mime;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MessageFormat;
use crate::error::{AppError, Result};
use crate::health::{DashboardView, Report};
use crate::metrics::HealthMetrics;

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    Delivered { report_id: Uuid, bytes: usize },
    Failed { report_id: Uuid, reason: String },
}

impl PublishOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PublishOutcome::Delivered { .. })
    }
}

impl MessageFormat {
    pub fn content_type(&self) -> Result<Mime> {
        match self {
            MessageFormat::Json => Ok(mime::APPLICATION_JSON),
            MessageFormat::Yaml => "application/yaml"
                .parse()
                .map_err(|e| AppError::Encoding(format!("invalid content type: {}", e))),
        }
    }
}

/// Encodes reports and hands them to a sink, once.
#[derive(Clone)]
pub struct Publisher {
    sink: Arc<dyn Sink>,
    format: MessageFormat,
    send_timeout: Duration,
    metrics: HealthMetrics,
}

impl Publisher {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        Self {
            sink,
            format: MessageFormat::Json,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            metrics: HealthMetrics::new(),
        }
    }

    pub fn with_format(mut self, format: MessageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: HealthMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &HealthMetrics {
        &self.metrics
    }

    /// Renders the full dashboard view of the report in the configured format.
    pub fn encode(&self, report: &Report) -> Result<EncodedMessage> {
        let view = DashboardView::from(report);
        let body = match self.format {
            MessageFormat::Json => serde_json::to_vec_pretty(&view)?,
            MessageFormat::Yaml => serde_yaml::to_string(&view)?.into_bytes(),
        };

        Ok(EncodedMessage {
            report_id: report.id(),
            content_type: self.format.content_type()?,
            body: Bytes::from(body),
        })
    }

    /// Single best-effort delivery attempt. Never fails; the outcome says
    /// what happened.
    pub async fn publish(&self, report: &Report) -> PublishOutcome {
        let report_id = report.id();

        let outcome = match self.encode(report) {
            Err(e) => PublishOutcome::Failed {
                report_id,
                reason: format!("encoding failed: {}", e),
            },
            Ok(message) => {
                match tokio::time::timeout(self.send_timeout, self.sink.send(&message)).await {
                    Ok(Ok(())) => PublishOutcome::Delivered {
                        report_id,
                        bytes: message.len(),
                    },
                    Ok(Err(e)) => PublishOutcome::Failed {
                        report_id,
                        reason: e.to_string(),
                    },
                    Err(_) => PublishOutcome::Failed {
                        report_id,
                        reason: format!("send timed out after {:?}", self.send_timeout),
                    },
                }
            }
        };

        match &outcome {
            PublishOutcome::Delivered { bytes, .. } => {
                debug!(%report_id, sink = self.sink.name(), bytes, "Health report delivered");
            }
            PublishOutcome::Failed { reason, .. } => {
                warn!(%report_id, sink = self.sink.name(), "Failed to publish health report: {}", reason);
            }
        }

        self.metrics.record_publish(&outcome);
        outcome
    }
}
