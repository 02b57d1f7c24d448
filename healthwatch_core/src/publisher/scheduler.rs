//! Periodic health cycles feeding the publish queue

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::PublishQueue;
use crate::health::{HealthExecutor, Report, TagPredicate};
use crate::metrics::HealthMetrics;

/// Runs a cycle on a fixed period and queues each report for publishing.
pub struct PublishScheduler {
    executor: HealthExecutor,
    queue: PublishQueue,
    predicate: TagPredicate,
    delay: Duration,
    period: Duration,
    metrics: HealthMetrics,
}

impl PublishScheduler {
    pub fn new(executor: HealthExecutor, queue: PublishQueue) -> Self {
        Self {
            executor,
            queue,
            predicate: TagPredicate::All,
            delay: Duration::from_secs(5),
            period: Duration::from_secs(30),
            metrics: HealthMetrics::new(),
        }
    }

    pub fn with_predicate(mut self, predicate: TagPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_metrics(mut self, metrics: HealthMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// One cycle: run the checks, queue the report, return without waiting
    /// for delivery.
    pub async fn run_cycle(&self) -> Arc<Report> {
        let report = Arc::new(self.executor.run(&self.predicate).await);
        self.metrics.record_cycle(
            report.overall_status(),
            report.total_duration().as_millis() as u64,
        );

        if self.queue.submit(report.clone()) {
            debug!("Queued report {} for publishing", report.id());
        }
        report
    }

    /// Runs cycles until `shutdown` is cancelled. Cycles never overlap; a slow
    /// cycle pushes the next tick back.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = shutdown.cancelled() => return,
            }

            info!(
                "Publishing health reports every {:?} ({:?})",
                self.period, self.predicate
            );

            let mut interval = tokio::time::interval(self.period.max(Duration::from_millis(1)));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown.cancelled() => break,
                }
                self.run_cycle().await;
            }

            info!("Publish scheduler stopped");
        })
    }
}
