//! Database connectivity probe

use std::time::{Duration, Instant};

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::health::check::{CheckContext, CheckOutcome, HealthCheck};

pub struct DatabaseCheck {
    pool: SqlitePool,
}

impl DatabaseCheck {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Builds a lazily connecting pool, so an unreachable database shows up
    /// as a failing check instead of a startup error.
    pub fn from_url(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)?;

        Ok(Self::new(pool))
    }

    async fn probe(&self) -> std::result::Result<i32, sqlx::Error> {
        let row = sqlx::query("SELECT 1 as probe")
            .fetch_one(&self.pool)
            .await?;
        row.try_get("probe")
    }
}

#[async_trait::async_trait]
impl HealthCheck for DatabaseCheck {
    async fn check(&self, ctx: CheckContext) -> CheckOutcome {
        let start = Instant::now();

        let result = tokio::select! {
            result = self.probe() => result,
            _ = ctx.cancellation().cancelled() => {
                return CheckOutcome::failure(&ctx, "Database probe cancelled");
            }
        };
        let query_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(1) => CheckOutcome::healthy()
                .with_description("Database connection successful")
                .with_data("query_time_ms", query_time_ms),
            Ok(other) => CheckOutcome::failure(&ctx, "Database returned an unexpected probe value")
                .with_data("query_time_ms", query_time_ms)
                .with_data("probe_value", other),
            Err(e) => CheckOutcome::failure(&ctx, "Database connection failed")
                .with_data("error_type", "connection_failure")
                .with_data("query_time_ms", query_time_ms)
                .with_error(e),
        }
    }
}
