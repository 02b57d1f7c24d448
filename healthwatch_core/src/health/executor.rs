//! Concurrent, timeout-bounded execution of registered checks

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{error, info, warn};

use super::check::{CheckContext, CheckOutcome};
use super::registry::{RegisteredCheck, Registry, TagPredicate};
use super::report::{CheckResult, Report};
use super::status::HealthStatus;

/// Timeout applied to checks whose descriptor does not set one.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

pub const TIMED_OUT_DESCRIPTION: &str = "timed out";
pub const PANICKED_DESCRIPTION: &str = "check panicked";

/// Runs cycles over a shared registry snapshot.
#[derive(Debug, Clone)]
pub struct HealthExecutor {
    registry: Arc<Registry>,
    default_timeout: Duration,
}

impl HealthExecutor {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            default_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Runs every check matching `predicate` and folds the results into a report.
    ///
    /// Each check runs in its own task under its own timeout. The returned
    /// report always holds exactly one entry per selected check.
    pub async fn run(&self, predicate: &TagPredicate) -> Report {
        let started = Instant::now();
        let selected = self.registry.select(predicate);

        info!(
            "Running health check cycle for {} of {} checks",
            selected.len(),
            self.registry.len()
        );

        // join_all yields results in input order, not completion order.
        let entries = join_all(selected.into_iter().map(|entry| self.execute(entry))).await;
        let report = Report::new(entries, started.elapsed());

        info!(
            status = %report.overall_status(),
            duration_ms = report.total_duration().as_millis() as u64,
            "Health check cycle completed"
        );
        report
    }

    /// Runs a single check by name, outside of any tag selection.
    pub async fn run_one(&self, name: &str) -> Option<CheckResult> {
        let entry = self.registry.get(name)?.clone();
        Some(self.execute(entry).await)
    }

    async fn execute(&self, entry: RegisteredCheck) -> CheckResult {
        let descriptor = entry.descriptor;
        let timeout = descriptor.timeout.unwrap_or(self.default_timeout);
        let severity = descriptor.effective_failure_severity();
        let cancel = CancellationToken::new();
        let ctx = CheckContext::new(descriptor.clone(), cancel.clone());
        let check = entry.check;

        // If this future is dropped mid-cycle the check is still cancelled
        // and aborted.
        let _cancel_on_drop = cancel.clone().drop_guard();
        let started = Instant::now();
        let mut handle =
            AbortOnDropHandle::new(tokio::spawn(async move { check.check(ctx).await }));

        let mut outcome = match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => {
                error!("Health check '{}' panicked: {}", descriptor.name, join_error);
                CheckOutcome::new(severity)
                    .with_description(PANICKED_DESCRIPTION)
                    .with_error(join_error)
            }
            Err(_) => {
                cancel.cancel();
                handle.abort();
                CheckOutcome::new(severity)
                    .with_description(TIMED_OUT_DESCRIPTION)
                    .with_data("timeout_ms", timeout.as_millis() as u64)
            }
        };
        let duration = started.elapsed();

        // A check never reports worse than its configured severity.
        outcome.status = outcome.status.min(severity);

        match outcome.status {
            HealthStatus::Healthy => {
                info!("Health check '{}' passed in {:?}", descriptor.name, duration);
            }
            HealthStatus::Degraded => {
                warn!(
                    "Health check '{}' degraded in {:?}: {}",
                    descriptor.name,
                    duration,
                    outcome.description.as_deref().unwrap_or("no description")
                );
            }
            HealthStatus::Unhealthy => {
                error!(
                    "Health check '{}' failed in {:?}: {}",
                    descriptor.name,
                    duration,
                    outcome.description.as_deref().unwrap_or("no description")
                );
            }
        }

        CheckResult::from_outcome(&descriptor, outcome, duration)
    }
}
