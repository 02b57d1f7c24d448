//! Per-check results and the immutable report of one cycle

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::check::CheckOutcome;
use super::registry::CheckDescriptor;
use super::status::{aggregate, HealthStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: String,
    pub status: HealthStatus,
    pub description: Option<String>,
    pub data: BTreeMap<String, serde_json::Value>,
    pub duration: Duration,
    pub tags: BTreeSet<String>,
    pub error: Option<String>,
}

impl CheckResult {
    pub fn from_outcome(
        descriptor: &CheckDescriptor,
        outcome: CheckOutcome,
        duration: Duration,
    ) -> Self {
        Self {
            name: descriptor.name.clone(),
            status: outcome.status,
            description: outcome.description,
            data: outcome.data,
            duration,
            tags: descriptor.tags.clone(),
            error: outcome.error,
        }
    }
}

/// Counts of entries per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatusSummary {
    pub healthy: usize,
    pub degraded: usize,
    pub unhealthy: usize,
}

/// Output of one execution cycle. Entries keep registration order.
#[derive(Debug, Clone)]
pub struct Report {
    id: Uuid,
    generated_at: DateTime<Utc>,
    overall_status: HealthStatus,
    total_duration: Duration,
    entries: Vec<CheckResult>,
}

impl Report {
    pub fn new(entries: Vec<CheckResult>, total_duration: Duration) -> Self {
        let overall_status = aggregate(entries.iter().map(|entry| entry.status));

        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            overall_status,
            total_duration,
            entries,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn overall_status(&self) -> HealthStatus {
        self.overall_status
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn entries(&self) -> &[CheckResult] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&CheckResult> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn summary(&self) -> StatusSummary {
        self.entries
            .iter()
            .fold(StatusSummary::default(), |mut summary, entry| {
                match entry.status {
                    HealthStatus::Healthy => summary.healthy += 1,
                    HealthStatus::Degraded => summary.degraded += 1,
                    HealthStatus::Unhealthy => summary.unhealthy += 1,
                }
                summary
            })
    }
}
