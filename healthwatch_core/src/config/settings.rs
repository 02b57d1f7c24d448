use config::{Config, ConfigError, Environment, File};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::health::{CheckDescriptor, HealthStatus, TagPredicate};

pub const CONFIG_FILE: &str = "healthwatch.toml";
pub const ENV_PREFIX: &str = "HEALTHWATCH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub health: HealthConfig,
    pub endpoints: EndpointConfig,
    pub publisher: PublisherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub default_timeout_ms: u64,
    pub checks: Vec<CheckConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    pub name: String,
    pub probe: ProbeConfig,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_failure_severity")]
    pub failure_severity: HealthStatus,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProbeConfig {
    Filesystem { path: PathBuf },
    Database { url: String },
    Url { url: String },
    Memory { max_used_percent: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    All,
    AnyOf,
    AllOf,
    NoneOf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    pub mode: FilterMode,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub ready: TagFilter,
    pub live: TagFilter,
    pub status_codes: StatusCodeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCodeConfig {
    pub healthy: u16,
    pub degraded: u16,
    pub unhealthy: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Log,
    Http { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    pub enabled: bool,
    pub delay_ms: u64,
    pub period_ms: u64,
    pub send_timeout_ms: u64,
    pub queue_capacity: usize,
    pub format: MessageFormat,
    pub filter: TagFilter,
    pub sink: SinkConfig,
}

fn default_failure_severity() -> HealthStatus {
    HealthStatus::Unhealthy
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            checks: Vec::new(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            ready: TagFilter::all_of(["ready"]),
            live: TagFilter::all_of(["live"]),
            status_codes: StatusCodeConfig::default(),
        }
    }
}

impl Default for StatusCodeConfig {
    fn default() -> Self {
        Self {
            healthy: 200,
            degraded: 500,
            unhealthy: 503,
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 5_000,
            period_ms: 30_000,
            send_timeout_ms: 5_000,
            queue_capacity: 16,
            format: MessageFormat::Json,
            filter: TagFilter::all(),
            sink: SinkConfig::Log,
        }
    }
}

impl HealthConfig {
    /// Checks used when the configuration defines none.
    pub fn default_checks() -> Vec<CheckConfig> {
        vec![
            CheckConfig {
                name: "filesystem".to_string(),
                probe: ProbeConfig::Filesystem {
                    path: PathBuf::from("."),
                },
                tags: vec!["ready".to_string()],
                failure_severity: HealthStatus::Degraded,
                timeout_ms: Some(1_000),
            },
            CheckConfig {
                name: "database".to_string(),
                probe: ProbeConfig::Database {
                    url: "sqlite::memory:".to_string(),
                },
                tags: vec!["ready".to_string()],
                failure_severity: HealthStatus::Unhealthy,
                timeout_ms: Some(2_000),
            },
            CheckConfig {
                name: "memory".to_string(),
                probe: ProbeConfig::Memory {
                    max_used_percent: 95.0,
                },
                tags: vec!["live".to_string()],
                failure_severity: HealthStatus::Degraded,
                timeout_ms: Some(1_000),
            },
        ]
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl CheckConfig {
    pub fn descriptor(&self) -> CheckDescriptor {
        let mut descriptor = CheckDescriptor::new(self.name.clone())
            .with_tags(self.tags.iter().cloned())
            .with_failure_severity(self.failure_severity);

        if let Some(timeout_ms) = self.timeout_ms {
            descriptor = descriptor.with_timeout(Duration::from_millis(timeout_ms));
        }
        descriptor
    }
}

impl TagFilter {
    pub fn all() -> Self {
        Self {
            mode: FilterMode::All,
            tags: Vec::new(),
        }
    }

    pub fn all_of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: FilterMode::AllOf,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn predicate(&self) -> TagPredicate {
        let tags = self.tags.iter().cloned();
        match self.mode {
            FilterMode::All => TagPredicate::All,
            FilterMode::AnyOf => TagPredicate::any_of(tags),
            FilterMode::AllOf => TagPredicate::all_of(tags),
            FilterMode::NoneOf => TagPredicate::none_of(tags),
        }
    }
}

impl StatusCodeConfig {
    pub fn status_code(&self, status: HealthStatus) -> StatusCode {
        let code = match status {
            HealthStatus::Healthy => self.healthy,
            HealthStatus::Degraded => self.degraded,
            HealthStatus::Unhealthy => self.unhealthy,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl PublisherConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Defaults, then the file at `path` if it exists, then `HEALTHWATCH__*`
    /// environment variables (e.g. `HEALTHWATCH__SERVER__PORT`).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        if app_config.health.checks.is_empty() {
            app_config.health.checks = HealthConfig::default_checks();
        }

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.health.default_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Default check timeout must be greater than 0".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for check in &self.health.checks {
            validate_check(check)?;

            if !names.insert(check.name.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Duplicate health check name: {}",
                    check.name
                )));
            }
        }

        validate_filter("endpoints.ready", &self.endpoints.ready)?;
        validate_filter("endpoints.live", &self.endpoints.live)?;

        let codes = &self.endpoints.status_codes;
        for code in [codes.healthy, codes.degraded, codes.unhealthy] {
            if !(100..=599).contains(&code) {
                return Err(ConfigError::Message(format!(
                    "Invalid HTTP status code: {}",
                    code
                )));
            }
        }

        if self.publisher.enabled {
            if self.publisher.period_ms == 0 {
                return Err(ConfigError::Message(
                    "Publisher period must be greater than 0".to_string(),
                ));
            }

            if self.publisher.send_timeout_ms == 0 {
                return Err(ConfigError::Message(
                    "Publisher send timeout must be greater than 0".to_string(),
                ));
            }

            if self.publisher.queue_capacity == 0 {
                return Err(ConfigError::Message(
                    "Publisher queue capacity must be greater than 0".to_string(),
                ));
            }

            validate_filter("publisher.filter", &self.publisher.filter)?;

            if let SinkConfig::Http { url } = &self.publisher.sink {
                if url.is_empty() {
                    return Err(ConfigError::Message(
                        "Publisher webhook URL cannot be empty".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn validate_check(check: &CheckConfig) -> Result<(), ConfigError> {
    if check.name.trim().is_empty() {
        return Err(ConfigError::Message(
            "Health check name cannot be empty".to_string(),
        ));
    }

    if check.failure_severity == HealthStatus::Healthy {
        return Err(ConfigError::Message(format!(
            "Health check '{}' failure severity must be degraded or unhealthy",
            check.name
        )));
    }

    if check.timeout_ms == Some(0) {
        return Err(ConfigError::Message(format!(
            "Health check '{}' timeout must be greater than 0",
            check.name
        )));
    }

    match &check.probe {
        ProbeConfig::Filesystem { path } if path.as_os_str().is_empty() => Err(
            ConfigError::Message(format!("Health check '{}' has an empty path", check.name)),
        ),
        ProbeConfig::Database { url } | ProbeConfig::Url { url } if url.is_empty() => Err(
            ConfigError::Message(format!("Health check '{}' has an empty URL", check.name)),
        ),
        ProbeConfig::Memory { max_used_percent }
            if !(*max_used_percent > 0.0 && *max_used_percent <= 100.0) =>
        {
            Err(ConfigError::Message(format!(
                "Health check '{}' memory threshold must be within (0, 100]",
                check.name
            )))
        }
        _ => Ok(()),
    }
}

fn validate_filter(section: &str, filter: &TagFilter) -> Result<(), ConfigError> {
    if filter.mode != FilterMode::All && filter.tags.is_empty() {
        return Err(ConfigError::Message(format!(
            "{} must list at least one tag unless mode is 'all'",
            section
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.health.default_timeout(), Duration::from_secs(30));
        assert_eq!(config.publisher.period(), Duration::from_secs(30));
        assert_eq!(config.publisher.delay(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.health.default_timeout_ms = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.health.checks = HealthConfig::default_checks();
        config.health.checks[0].timeout_ms = Some(0);
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.endpoints.ready.tags.clear();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.endpoints.status_codes.degraded = 42;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.publisher.queue_capacity = 0;
        assert!(config.validate().is_err());

        config.publisher.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_check_names_rejected() {
        let mut config = AppConfig::default();
        let mut checks = HealthConfig::default_checks();
        checks[1].name = checks[0].name.clone();
        config.health.checks = checks;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate health check name"));
    }

    #[test]
    fn test_memory_threshold_bounds() {
        let mut config = AppConfig::default();
        config.health.checks = vec![CheckConfig {
            name: "memory".to_string(),
            probe: ProbeConfig::Memory {
                max_used_percent: 120.0,
            },
            tags: Vec::new(),
            failure_severity: HealthStatus::Unhealthy,
            timeout_ms: None,
        }];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");

        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_address(), "0.0.0.0:9090");
    }

    #[test]
    fn test_status_code_mapping() {
        let codes = StatusCodeConfig::default();
        assert_eq!(codes.status_code(HealthStatus::Healthy), StatusCode::OK);
        assert_eq!(
            codes.status_code(HealthStatus::Degraded),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            codes.status_code(HealthStatus::Unhealthy),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_tag_filter_predicates() {
        let ready: std::collections::BTreeSet<String> =
            ["ready".to_string()].into_iter().collect();

        assert!(TagFilter::all().predicate().matches(&ready));
        assert!(TagFilter::all_of(["ready"]).predicate().matches(&ready));

        let complement = TagFilter {
            mode: FilterMode::NoneOf,
            tags: vec!["ready".to_string()],
        };
        assert!(!complement.predicate().matches(&ready));
    }

    #[test]
    fn test_missing_file_falls_back_to_default_checks() {
        let config = AppConfig::load_from(Path::new("does-not-exist/healthwatch.toml"))
            .expect("Should load default configuration");

        assert_eq!(config.health.checks, HealthConfig::default_checks());
        assert_eq!(config.endpoints.ready, TagFilter::all_of(["ready"]));

        let checks: Vec<_> = config
            .health
            .checks
            .iter()
            .map(|check| (check.name.as_str(), check.failure_severity, check.tags.clone()))
            .collect();
        assert_eq!(
            checks,
            vec![
                ("filesystem", HealthStatus::Degraded, vec!["ready".to_string()]),
                ("database", HealthStatus::Unhealthy, vec!["ready".to_string()]),
                ("memory", HealthStatus::Degraded, vec!["live".to_string()]),
            ]
        );
        assert_eq!(
            config.health.checks[1].probe,
            ProbeConfig::Database {
                url: "sqlite::memory:".to_string()
            }
        );
    }

    #[test]
    fn test_healthy_failure_severity_rejected() {
        let mut config = AppConfig::default();
        let mut checks = HealthConfig::default_checks();
        checks[0].failure_severity = HealthStatus::Healthy;
        config.health.checks = checks;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("failure severity"));
    }

    #[test]
    fn test_healthy_failure_severity_rejected_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"
[[health.checks]]
name = "disk"
failure_severity = "healthy"
probe = {{ type = "filesystem", path = "/tmp" }}
"#
        )
        .unwrap();

        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_config_loading_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"
[health]
default_timeout_ms = 5000

[[health.checks]]
name = "disk"
tags = ["ready"]
failure_severity = "degraded"
timeout_ms = 1000
probe = {{ type = "filesystem", path = "/tmp" }}

[[health.checks]]
name = "db"
tags = ["ready"]
probe = {{ type = "database", url = "sqlite::memory:" }}

[publisher]
format = "yaml"
sink = {{ type = "http", url = "http://127.0.0.1:9/hooks/health" }}
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).expect("Should load file configuration");

        assert_eq!(config.health.default_timeout(), Duration::from_secs(5));
        assert_eq!(config.health.checks.len(), 2);

        let disk = &config.health.checks[0];
        assert_eq!(disk.failure_severity, HealthStatus::Degraded);
        assert_eq!(
            disk.probe,
            ProbeConfig::Filesystem {
                path: PathBuf::from("/tmp")
            }
        );
        assert_eq!(
            disk.descriptor().timeout,
            Some(Duration::from_millis(1000))
        );

        let db = &config.health.checks[1];
        assert_eq!(db.failure_severity, HealthStatus::Unhealthy);
        assert_eq!(db.timeout_ms, None);

        assert_eq!(config.publisher.format, MessageFormat::Yaml);
        assert_eq!(
            config.publisher.sink,
            SinkConfig::Http {
                url: "http://127.0.0.1:9/hooks/health".to_string()
            }
        );
        assert_eq!(config.publisher.period_ms, 30_000);
    }
}
