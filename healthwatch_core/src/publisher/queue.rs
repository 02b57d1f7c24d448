//! Bounded queue between health cycles and the publishing worker

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::Publisher;
use crate::health::Report;
use crate::metrics::HealthMetrics;

/// Bounded hand-off between cycles and the publishing worker.
#[derive(Clone)]
pub struct PublishQueue {
    sender: mpsc::Sender<Arc<Report>>,
    metrics: HealthMetrics,
}

impl PublishQueue {
    /// Spawns the worker that drains the queue through `publisher`.
    pub fn start(publisher: Publisher, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let metrics = publisher.metrics().clone();

        let worker = tokio::spawn(async move {
            Self::process_queue(publisher, receiver).await;
        });

        (Self { sender, metrics }, worker)
    }

    /// Queues a report without waiting. Returns `false` when the report was
    /// dropped because the queue is full or the worker has stopped.
    pub fn submit(&self, report: Arc<Report>) -> bool {
        match self.sender.try_send(report) {
            Ok(()) => true,
            Err(TrySendError::Full(report)) => {
                warn!("Publish queue full, dropping report {}", report.id());
                self.metrics.record_dropped();
                false
            }
            Err(TrySendError::Closed(report)) => {
                warn!("Publish worker stopped, dropping report {}", report.id());
                self.metrics.record_dropped();
                false
            }
        }
    }

    async fn process_queue(publisher: Publisher, mut receiver: mpsc::Receiver<Arc<Report>>) {
        info!("Publish queue processor started");

        while let Some(report) = receiver.recv().await {
            publisher.publish(&report).await;
        }

        warn!("Publish queue processor stopped");
    }
}
