//! Cycle and publish counters

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use parking_lot::RwLock;
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

use crate::health::HealthStatus;
use crate::publisher::PublishOutcome;

#[derive(Clone)]
pub struct HealthMetrics {
    cycles_total: Arc<AtomicU64>,
    cycles_degraded: Arc<AtomicU64>,
    cycles_unhealthy: Arc<AtomicU64>,
    publish_delivered: Arc<AtomicU64>,
    publish_failed: Arc<AtomicU64>,
    publish_dropped: Arc<AtomicU64>,
    last_cycle: Arc<RwLock<Option<CycleRecord>>>,
    last_publish: Arc<RwLock<Option<PublishRecord>>>,
    start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub timestamp: DateTime<Utc>,
    pub status: HealthStatus,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishRecord {
    pub timestamp: DateTime<Utc>,
    pub outcome: PublishOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_total: u64,
    pub cycles_degraded: u64,
    pub cycles_unhealthy: u64,
    pub publish_delivered: u64,
    pub publish_failed: u64,
    pub publish_dropped: u64,
    pub last_cycle: Option<CycleRecord>,
    pub last_publish: Option<PublishRecord>,
    pub uptime_seconds: i64,
}

impl HealthMetrics {
    pub fn new() -> Self {
        Self {
            cycles_total: Arc::new(AtomicU64::new(0)),
            cycles_degraded: Arc::new(AtomicU64::new(0)),
            cycles_unhealthy: Arc::new(AtomicU64::new(0)),
            publish_delivered: Arc::new(AtomicU64::new(0)),
            publish_failed: Arc::new(AtomicU64::new(0)),
            publish_dropped: Arc::new(AtomicU64::new(0)),
            last_cycle: Arc::new(RwLock::new(None)),
            last_publish: Arc::new(RwLock::new(None)),
            start_time: Utc::now(),
        }
    }

    pub fn record_cycle(&self, status: HealthStatus, duration_ms: u64) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);

        match status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded => {
                self.cycles_degraded.fetch_add(1, Ordering::Relaxed);
            }
            HealthStatus::Unhealthy => {
                self.cycles_unhealthy.fetch_add(1, Ordering::Relaxed);
            }
        }

        *self.last_cycle.write() = Some(CycleRecord {
            timestamp: Utc::now(),
            status,
            duration_ms,
        });
    }

    pub fn record_publish(&self, outcome: &PublishOutcome) {
        match outcome {
            PublishOutcome::Delivered { .. } => {
                self.publish_delivered.fetch_add(1, Ordering::Relaxed);
            }
            PublishOutcome::Failed { .. } => {
                self.publish_failed.fetch_add(1, Ordering::Relaxed);
            }
        }

        *self.last_publish.write() = Some(PublishRecord {
            timestamp: Utc::now(),
            outcome: outcome.clone(),
        });
    }

    pub fn record_dropped(&self) {
        self.publish_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            cycles_degraded: self.cycles_degraded.load(Ordering::Relaxed),
            cycles_unhealthy: self.cycles_unhealthy.load(Ordering::Relaxed),
            publish_delivered: self.publish_delivered.load(Ordering::Relaxed),
            publish_failed: self.publish_failed.load(Ordering::Relaxed),
            publish_dropped: self.publish_dropped.load(Ordering::Relaxed),
            last_cycle: self.last_cycle.read().clone(),
            last_publish: self.last_publish.read().clone(),
            uptime_seconds: (Utc::now() - self.start_time).num_seconds(),
        }
    }
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self::new()
    }
}
