//! Process host memory probe

use parking_lot::Mutex;
use sysinfo::System;

use crate::health::check::{CheckContext, CheckOutcome, HealthCheck};

pub struct MemoryCheck {
    max_used_percent: f64,
    system: Mutex<System>,
}

impl MemoryCheck {
    pub fn new(max_used_percent: f64) -> Self {
        Self {
            max_used_percent,
            system: Mutex::new(System::new()),
        }
    }

    fn sample(&self) -> (u64, u64) {
        let mut system = self.system.lock();
        system.refresh_memory();
        (system.used_memory(), system.total_memory())
    }
}

#[async_trait::async_trait]
impl HealthCheck for MemoryCheck {
    async fn check(&self, ctx: CheckContext) -> CheckOutcome {
        let (used, total) = self.sample();

        if total == 0 {
            return CheckOutcome::failure(&ctx, "Memory information unavailable");
        }

        let used_percent = (used as f64 / total as f64) * 100.0;
        let outcome = if used_percent > self.max_used_percent {
            CheckOutcome::failure(&ctx, "Memory usage above threshold")
        } else {
            CheckOutcome::healthy()
        };

        outcome
            .with_data("used_bytes", used)
            .with_data("total_bytes", total)
            .with_data("used_percent", (used_percent * 100.0).round() / 100.0)
            .with_data("threshold_percent", self.max_used_percent)
    }
}
