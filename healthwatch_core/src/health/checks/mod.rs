//! Built-in check variants and registry construction from configuration

pub mod custom;
pub mod database;
pub mod filesystem;
pub mod memory;
pub mod url;

pub use custom::CustomCheck;
pub use database::DatabaseCheck;
pub use filesystem::FilePathWriteCheck;
pub use memory::MemoryCheck;
pub use url::UrlCheck;

use std::sync::Arc;

use tracing::info;

use super::check::HealthCheck;
use super::registry::Registry;
use crate::config::{HealthConfig, ProbeConfig};
use crate::error::Result;

pub fn build_check(probe: &ProbeConfig) -> Result<Arc<dyn HealthCheck>> {
    let check: Arc<dyn HealthCheck> = match probe {
        ProbeConfig::Filesystem { path } => Arc::new(FilePathWriteCheck::new(path.clone())),
        ProbeConfig::Database { url } => Arc::new(DatabaseCheck::from_url(url)?),
        ProbeConfig::Url { url } => Arc::new(UrlCheck::new(url)?),
        ProbeConfig::Memory { max_used_percent } => Arc::new(MemoryCheck::new(*max_used_percent)),
    };
    Ok(check)
}

/// Registers every configured check, in configuration order.
pub fn build_registry(config: &HealthConfig) -> Result<Registry> {
    let mut registry = Registry::new();

    for check_config in &config.checks {
        let check = build_check(&check_config.probe)?;
        registry.register_shared(check_config.descriptor(), check)?;
    }

    info!("Registered {} health checks: {:?}", registry.len(), registry.names());
    Ok(registry)
}
