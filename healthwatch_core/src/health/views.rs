//! Audience-specific renderings of a report
//!
//! Every view is a pure function of a [`Report`]. Optional fields render as
//! `null` and empty collections as `{}` / `[]`; nothing is skipped.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::report::{CheckResult, Report, StatusSummary};
use super::status::HealthStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryView {
    pub name: String,
    pub status: HealthStatus,
    pub description: Option<String>,
    pub duration_ms: u64,
    pub tags: Vec<String>,
    pub data: BTreeMap<String, serde_json::Value>,
    pub error: Option<String>,
}

impl From<&CheckResult> for EntryView {
    fn from(result: &CheckResult) -> Self {
        Self {
            name: result.name.clone(),
            status: result.status,
            description: result.description.clone(),
            duration_ms: result.duration.as_millis() as u64,
            tags: result.tags.iter().cloned().collect(),
            data: result.data.clone(),
            error: result.error.clone(),
        }
    }
}

/// Full detail for consumers that need root causes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessView {
    pub status: HealthStatus,
    pub total_duration_ms: u64,
    pub entries: Vec<EntryView>,
}

impl From<&Report> for ReadinessView {
    fn from(report: &Report) -> Self {
        Self {
            status: report.overall_status(),
            total_duration_ms: report.total_duration().as_millis() as u64,
            entries: report.entries().iter().map(EntryView::from).collect(),
        }
    }
}

/// Summary only; liveness probes must not depend on dependency detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessView {
    pub status: HealthStatus,
    pub total_duration_ms: u64,
}

impl From<&Report> for LivenessView {
    fn from(report: &Report) -> Self {
        Self {
            status: report.overall_status(),
            total_duration_ms: report.total_duration().as_millis() as u64,
        }
    }
}

/// Interactive display and publishing. Carries the readiness content plus
/// report identity and per-status counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub status: HealthStatus,
    pub total_duration_ms: u64,
    pub summary: StatusSummary,
    pub entries: Vec<EntryView>,
}

impl From<&Report> for DashboardView {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id(),
            generated_at: report.generated_at(),
            status: report.overall_status(),
            total_duration_ms: report.total_duration().as_millis() as u64,
            summary: report.summary(),
            entries: report.entries().iter().map(EntryView::from).collect(),
        }
    }
}
