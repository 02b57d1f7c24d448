//! Registered checks and tag-based selection

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::check::HealthCheck;
use super::status::HealthStatus;
use crate::error::{AppError, Result};

/// Static description of a registered check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDescriptor {
    pub name: String,
    pub tags: BTreeSet<String>,
    pub failure_severity: HealthStatus,
    pub timeout: Option<Duration>,
}

impl CheckDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeSet::new(),
            failure_severity: HealthStatus::Unhealthy,
            timeout: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Healthy is not a failure; it is raised to Degraded.
    pub fn with_failure_severity(mut self, severity: HealthStatus) -> Self {
        self.failure_severity = severity.max(HealthStatus::Degraded);
        self
    }

    /// Severity reported when the check fails, never Healthy even if the
    /// field was set directly.
    pub fn effective_failure_severity(&self) -> HealthStatus {
        self.failure_severity.max(HealthStatus::Degraded)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Selects which registered checks take part in a cycle.
#[derive(Clone, Default)]
pub enum TagPredicate {
    /// Every registered check.
    #[default]
    All,
    /// Checks carrying at least one of the tags.
    AnyOf(BTreeSet<String>),
    /// Checks carrying every one of the tags.
    AllOf(BTreeSet<String>),
    /// Checks carrying none of the tags.
    NoneOf(BTreeSet<String>),
    Custom(Arc<dyn Fn(&BTreeSet<String>) -> bool + Send + Sync>),
}

impl TagPredicate {
    pub fn any_of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagPredicate::AnyOf(tags.into_iter().map(Into::into).collect())
    }

    pub fn all_of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagPredicate::AllOf(tags.into_iter().map(Into::into).collect())
    }

    pub fn none_of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagPredicate::NoneOf(tags.into_iter().map(Into::into).collect())
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&BTreeSet<String>) -> bool + Send + Sync + 'static,
    {
        TagPredicate::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, tags: &BTreeSet<String>) -> bool {
        match self {
            TagPredicate::All => true,
            TagPredicate::AnyOf(wanted) => wanted.iter().any(|tag| tags.contains(tag)),
            TagPredicate::AllOf(wanted) => wanted.is_subset(tags),
            TagPredicate::NoneOf(excluded) => excluded.is_disjoint(tags),
            TagPredicate::Custom(predicate) => predicate(tags),
        }
    }
}

impl fmt::Debug for TagPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagPredicate::All => write!(f, "All"),
            TagPredicate::AnyOf(tags) => f.debug_tuple("AnyOf").field(tags).finish(),
            TagPredicate::AllOf(tags) => f.debug_tuple("AllOf").field(tags).finish(),
            TagPredicate::NoneOf(tags) => f.debug_tuple("NoneOf").field(tags).finish(),
            TagPredicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A descriptor bound to its check implementation.
#[derive(Clone)]
pub struct RegisteredCheck {
    pub descriptor: Arc<CheckDescriptor>,
    pub check: Arc<dyn HealthCheck>,
}

impl fmt::Debug for RegisteredCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCheck")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Ordered set of checks, built at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegisteredCheck>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C>(&mut self, descriptor: CheckDescriptor, check: C) -> Result<()>
    where
        C: HealthCheck + 'static,
    {
        self.register_shared(descriptor, Arc::new(check))
    }

    pub fn register_shared(
        &mut self,
        descriptor: CheckDescriptor,
        check: Arc<dyn HealthCheck>,
    ) -> Result<()> {
        if self.get(&descriptor.name).is_some() {
            return Err(AppError::DuplicateCheck(descriptor.name));
        }

        debug!(
            name = %descriptor.name,
            tags = ?descriptor.tags,
            severity = %descriptor.failure_severity,
            "registered health check"
        );

        self.entries.push(RegisteredCheck {
            descriptor: Arc::new(descriptor),
            check,
        });
        Ok(())
    }

    /// Builder form of [`Registry::register`].
    pub fn with_check<C>(mut self, descriptor: CheckDescriptor, check: C) -> Result<Self>
    where
        C: HealthCheck + 'static,
    {
        self.register(descriptor, check)?;
        Ok(self)
    }

    /// Matching checks in registration order.
    pub fn select(&self, predicate: &TagPredicate) -> Vec<RegisteredCheck> {
        self.entries
            .iter()
            .filter(|entry| predicate.matches(&entry.descriptor.tags))
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCheck> {
        self.entries.iter().find(|entry| entry.descriptor.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
