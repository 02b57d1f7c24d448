//! The pluggable check capability and the values it produces

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::registry::CheckDescriptor;
use super::status::HealthStatus;

/// A single probe of one dependency.
///
/// Implementations must not return early with a panic or hang forever: any
/// failure is reported as a [`CheckOutcome`] at the severity configured on the
/// owning descriptor, and the cancellation token in [`CheckContext`] should be
/// honored by long-running probes.
#[async_trait::async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self, ctx: CheckContext) -> CheckOutcome;
}

/// Per-invocation context handed to a check by the executor.
#[derive(Debug, Clone)]
pub struct CheckContext {
    descriptor: Arc<CheckDescriptor>,
    cancel: CancellationToken,
}

impl CheckContext {
    pub fn new(descriptor: Arc<CheckDescriptor>, cancel: CancellationToken) -> Self {
        Self { descriptor, cancel }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn failure_severity(&self) -> HealthStatus {
        self.descriptor.effective_failure_severity()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// What a check reports back. The executor adds name, tags and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub status: HealthStatus,
    pub description: Option<String>,
    pub data: BTreeMap<String, serde_json::Value>,
    pub error: Option<String>,
}

impl CheckOutcome {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            description: None,
            data: BTreeMap::new(),
            error: None,
        }
    }

    pub fn healthy() -> Self {
        Self::new(HealthStatus::Healthy)
    }

    pub fn degraded(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded).with_description(description)
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unhealthy).with_description(description)
    }

    /// A failed probe, reported at the descriptor's configured severity.
    pub fn failure(ctx: &CheckContext, description: impl Into<String>) -> Self {
        Self::new(ctx.failure_severity()).with_description(description)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_error(mut self, error: impl Display) -> Self {
        self.error = Some(error.to_string());
        self
    }
}
