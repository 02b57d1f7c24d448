//! Closure-backed checks for application-defined dependencies

use std::future::Future;

use futures_util::future::BoxFuture;

use crate::health::check::{CheckContext, CheckOutcome, HealthCheck};

type ProbeFn = dyn Fn() -> BoxFuture<'static, anyhow::Result<String>> + Send + Sync;

/// Wraps an async closure. `Ok(message)` is healthy with the message as the
/// description; `Err` is reported at the configured severity.
pub struct CustomCheck {
    probe: Box<ProbeFn>,
}

impl CustomCheck {
    pub fn new<F, Fut>(probe: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        Self {
            probe: Box::new(move || -> BoxFuture<'static, anyhow::Result<String>> {
                Box::pin(probe())
            }),
        }
    }

    /// Synchronous variant for cheap in-process checks.
    pub fn from_fn<F>(probe: F) -> Self
    where
        F: Fn() -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self {
            probe: Box::new(move || -> BoxFuture<'static, anyhow::Result<String>> {
                let result = probe();
                Box::pin(async move { result })
            }),
        }
    }
}

#[async_trait::async_trait]
impl HealthCheck for CustomCheck {
    async fn check(&self, ctx: CheckContext) -> CheckOutcome {
        let result = tokio::select! {
            result = (self.probe)() => result,
            _ = ctx.cancellation().cancelled() => {
                return CheckOutcome::failure(&ctx, "Dependency check cancelled");
            }
        };

        match result {
            Ok(message) => CheckOutcome::healthy().with_description(message),
            Err(e) => CheckOutcome::failure(&ctx, "Dependency check failed")
                .with_error(format!("{:#}", e))
                .with_data("dependency", ctx.name()),
        }
    }
}
