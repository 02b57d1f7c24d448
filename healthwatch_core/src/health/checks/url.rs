//! Remote URL availability probe

use bytes::Bytes;
use http::Method;

use crate::error::Result;
use crate::health::check::{CheckContext, CheckOutcome, HealthCheck};
use crate::http_client::{self, HttpTarget};

/// Issues a GET and expects a 2xx response.
pub struct UrlCheck {
    target: HttpTarget,
}

impl UrlCheck {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            target: HttpTarget::parse(url)?,
        })
    }
}

#[async_trait::async_trait]
impl HealthCheck for UrlCheck {
    async fn check(&self, ctx: CheckContext) -> CheckOutcome {
        let url = self.target.url();

        let result = tokio::select! {
            result = http_client::send(&self.target, Method::GET, None, Bytes::new()) => result,
            _ = ctx.cancellation().cancelled() => {
                return CheckOutcome::failure(&ctx, "URL probe cancelled").with_data("url", url);
            }
        };

        match result {
            Ok(status) if status.is_success() => CheckOutcome::healthy()
                .with_data("url", url)
                .with_data("status", status.as_u16()),
            Ok(status) => CheckOutcome::failure(&ctx, "Endpoint returned a non-success status")
                .with_data("url", url)
                .with_data("status", status.as_u16()),
            Err(e) => CheckOutcome::failure(&ctx, "Endpoint unreachable")
                .with_data("url", url)
                .with_error(e),
        }
    }
}
