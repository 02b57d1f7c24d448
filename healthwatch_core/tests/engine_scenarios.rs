use healthwatch_core::health::{CustomCheck, FilePathWriteCheck, MemoryCheck};
use healthwatch_core::{
    build_registry, CheckDescriptor, HealthExecutor, HealthStatus, ReadinessView, Registry,
    TagPredicate,
};
use healthwatch_core::config::{CheckConfig, HealthConfig, ProbeConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn ready_and_live_registry(temp_dir: &TempDir) -> Registry {
    Registry::new()
        .with_check(
            CheckDescriptor::new("disk").with_tags(["ready"]),
            FilePathWriteCheck::new(temp_dir.path()),
        )
        .unwrap()
        .with_check(
            CheckDescriptor::new("db")
                .with_tags(["ready"])
                .with_timeout(Duration::from_secs(2)),
            CustomCheck::new(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok("connected".to_string())
            }),
        )
        .unwrap()
        .with_check(
            CheckDescriptor::new("memory").with_tags(["live"]),
            MemoryCheck::new(100.0),
        )
        .unwrap()
}

#[tokio::test]
async fn test_readiness_cycle_with_hanging_database() {
    let temp_dir = TempDir::new().unwrap();
    let executor = HealthExecutor::new(Arc::new(ready_and_live_registry(&temp_dir)));

    let started = Instant::now();
    let report = executor.run(&TagPredicate::all_of(["ready"])).await;
    let elapsed = started.elapsed();

    assert_eq!(report.entries().len(), 2);
    assert_eq!(report.entries()[0].name, "disk");
    assert_eq!(report.entries()[1].name, "db");

    assert_eq!(report.entry("disk").unwrap().status, HealthStatus::Healthy);
    let db = report.entry("db").unwrap();
    assert_eq!(db.status, HealthStatus::Unhealthy);
    assert_eq!(db.description.as_deref(), Some("timed out"));
    assert!(report.entry("memory").is_none());

    assert_eq!(report.overall_status(), HealthStatus::Unhealthy);
    assert!(report.total_duration() >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(3));
}

#[tokio::test]
async fn test_liveness_cycle_skips_dependencies() {
    let temp_dir = TempDir::new().unwrap();
    let executor = HealthExecutor::new(Arc::new(ready_and_live_registry(&temp_dir)));

    let started = Instant::now();
    let report = executor.run(&TagPredicate::all_of(["live"])).await;

    assert_eq!(report.entries().len(), 1);
    assert_eq!(report.overall_status(), HealthStatus::Healthy);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_empty_selection_is_healthy() {
    let temp_dir = TempDir::new().unwrap();
    let executor = HealthExecutor::new(Arc::new(ready_and_live_registry(&temp_dir)));

    let report = executor.run(&TagPredicate::all_of(["nonexistent"])).await;

    assert!(report.entries().is_empty());
    assert_eq!(report.overall_status(), HealthStatus::Healthy);

    let view = ReadinessView::from(&report);
    assert!(view.entries.is_empty());
}

#[tokio::test]
async fn test_concurrent_cycles_share_registry() {
    let temp_dir = TempDir::new().unwrap();
    let registry = Registry::new()
        .with_check(
            CheckDescriptor::new("disk").with_tags(["ready"]),
            FilePathWriteCheck::new(temp_dir.path()),
        )
        .unwrap()
        .with_check(
            CheckDescriptor::new("memory").with_tags(["live"]),
            MemoryCheck::new(100.0),
        )
        .unwrap();
    let executor = HealthExecutor::new(Arc::new(registry));

    let ready_pred = TagPredicate::all_of(["ready"]);
    let live_pred = TagPredicate::all_of(["live"]);
    let (ready, live, all) = tokio::join!(
        executor.run(&ready_pred),
        executor.run(&live_pred),
        executor.run(&TagPredicate::All),
    );

    assert_eq!(ready.entries().len(), 1);
    assert_eq!(live.entries().len(), 1);
    assert_eq!(all.entries().len(), 2);
    assert_ne!(ready.id(), all.id());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_registry_built_from_configuration() {
    let temp_dir = TempDir::new().unwrap();
    let config = HealthConfig {
        default_timeout_ms: 1_000,
        checks: vec![
            CheckConfig {
                name: "disk".to_string(),
                probe: ProbeConfig::Filesystem {
                    path: temp_dir.path().to_path_buf(),
                },
                tags: vec!["ready".to_string()],
                failure_severity: HealthStatus::Degraded,
                timeout_ms: None,
            },
            CheckConfig {
                name: "db".to_string(),
                probe: ProbeConfig::Database {
                    url: "sqlite::memory:".to_string(),
                },
                tags: vec!["ready".to_string()],
                failure_severity: HealthStatus::Unhealthy,
                timeout_ms: Some(500),
            },
        ],
    };

    let registry = build_registry(&config).unwrap();
    assert_eq!(registry.names(), vec!["disk", "db"]);
    assert_eq!(
        registry.get("db").unwrap().descriptor.timeout,
        Some(Duration::from_millis(500))
    );

    let executor = HealthExecutor::new(Arc::new(registry))
        .with_default_timeout(config.default_timeout());
    let report = executor.run(&TagPredicate::all_of(["ready"])).await;
    assert_eq!(report.overall_status(), HealthStatus::Healthy);
}

#[test]
fn test_duplicate_names_in_configuration_are_rejected() {
    let check = CheckConfig {
        name: "memory".to_string(),
        probe: ProbeConfig::Memory {
            max_used_percent: 95.0,
        },
        tags: vec![],
        failure_severity: HealthStatus::Degraded,
        timeout_ms: None,
    };
    let config = HealthConfig {
        default_timeout_ms: 1_000,
        checks: vec![check.clone(), check],
    };

    assert!(build_registry(&config).is_err());
}
