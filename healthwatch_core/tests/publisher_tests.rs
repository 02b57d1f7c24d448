use healthwatch_core::config::MessageFormat;
use healthwatch_core::health::{CustomCheck, DashboardView};
use healthwatch_core::publisher::{ChannelSink, EncodedMessage, HttpSink};
use healthwatch_core::{
    CheckDescriptor, CheckOutcome, CheckResult, HealthExecutor, HealthMetrics, HealthStatus,
    PublishOutcome, PublishQueue, PublishScheduler, Publisher, ReadinessView, Registry, Report,
    Result, Sink,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

fn sample_report() -> Report {
    let api = CheckDescriptor::new("api").with_tags(["ready"]);
    let cache = CheckDescriptor::new("cache").with_failure_severity(HealthStatus::Degraded);

    Report::new(
        vec![
            CheckResult::from_outcome(&api, CheckOutcome::healthy(), Duration::from_millis(4)),
            CheckResult::from_outcome(
                &cache,
                CheckOutcome::degraded("slow responses").with_data("latency_ms", 900u64),
                Duration::from_millis(12),
            ),
        ],
        Duration::from_millis(13),
    )
}

/// Blocks every send until released, so the queue can be filled.
struct GatedSink {
    gate: Arc<Notify>,
}

#[async_trait::async_trait]
impl Sink for GatedSink {
    fn name(&self) -> &str {
        "gated"
    }

    async fn send(&self, _message: &EncodedMessage) -> Result<()> {
        self.gate.notified().await;
        Ok(())
    }
}

#[tokio::test]
async fn test_publish_json_to_channel() {
    let (sink, mut receiver) = ChannelSink::new(4);
    let metrics = HealthMetrics::new();
    let publisher = Publisher::new(Arc::new(sink)).with_metrics(metrics.clone());
    let report = sample_report();

    let outcome = publisher.publish(&report).await;
    assert!(outcome.is_delivered());

    let message = receiver.recv().await.unwrap();
    assert_eq!(message.report_id, report.id());
    assert_eq!(message.content_type, mime::APPLICATION_JSON);

    let decoded: DashboardView = serde_json::from_slice(&message.body).unwrap();
    assert_eq!(decoded, DashboardView::from(&report));
    assert_eq!(decoded.summary.degraded, 1);

    assert_eq!(metrics.get_snapshot().publish_delivered, 1);
}

#[tokio::test]
async fn test_publish_yaml_to_channel() {
    let (sink, mut receiver) = ChannelSink::new(4);
    let publisher = Publisher::new(Arc::new(sink)).with_format(MessageFormat::Yaml);
    let report = sample_report();

    publisher.publish(&report).await;

    let message = receiver.recv().await.unwrap();
    assert_eq!(message.content_type.essence_str(), "application/yaml");

    let decoded: DashboardView = serde_yaml::from_slice(&message.body).unwrap();
    assert_eq!(decoded.id, report.id());
    assert_eq!(decoded.status, HealthStatus::Degraded);
    assert_eq!(decoded.entries.len(), 2);
}

#[tokio::test]
async fn test_unreachable_sink_does_not_affect_report() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = HttpSink::new(&format!("http://{}/hooks/health", addr)).unwrap();
    let metrics = HealthMetrics::new();
    let publisher = Publisher::new(Arc::new(sink)).with_metrics(metrics.clone());
    let report = sample_report();
    let before = serde_json::to_value(ReadinessView::from(&report)).unwrap();

    let outcome = publisher.publish(&report).await;

    match outcome {
        PublishOutcome::Failed { report_id, reason } => {
            assert_eq!(report_id, report.id());
            assert!(reason.contains("connection failed"), "reason: {}", reason);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(metrics.get_snapshot().publish_failed, 1);

    let after = serde_json::to_value(ReadinessView::from(&report)).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_slow_sink_is_bounded_by_send_timeout() {
    let gate = Arc::new(Notify::new());
    let publisher = Publisher::new(Arc::new(GatedSink { gate }))
        .with_send_timeout(Duration::from_millis(50));

    let outcome = publisher.publish(&sample_report()).await;

    match outcome {
        PublishOutcome::Failed { reason, .. } => assert!(reason.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_queue_drops_reports() {
    let gate = Arc::new(Notify::new());
    let metrics = HealthMetrics::new();
    let publisher = Publisher::new(Arc::new(GatedSink { gate: gate.clone() }))
        .with_metrics(metrics.clone());
    let (queue, _worker) = PublishQueue::start(publisher, 1);

    // The worker takes the first report and blocks in the sink, the second
    // fills the single slot.
    assert!(queue.submit(Arc::new(sample_report())));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(queue.submit(Arc::new(sample_report())));
    assert!(!queue.submit(Arc::new(sample_report())));

    assert_eq!(metrics.get_snapshot().publish_dropped, 1);

    gate.notify_one();
    gate.notify_one();
}

#[tokio::test]
async fn test_scheduler_cycle_queues_report() {
    let registry = Registry::new()
        .with_check(
            CheckDescriptor::new("queue").with_tags(["publish"]),
            CustomCheck::from_fn(|| Ok("reachable".to_string())),
        )
        .unwrap()
        .with_check(
            CheckDescriptor::new("local-only"),
            CustomCheck::from_fn(|| Ok("fine".to_string())),
        )
        .unwrap();
    let executor = HealthExecutor::new(Arc::new(registry));

    let (sink, mut receiver) = ChannelSink::new(4);
    let metrics = HealthMetrics::new();
    let publisher = Publisher::new(Arc::new(sink)).with_metrics(metrics.clone());
    let (queue, _worker) = PublishQueue::start(publisher, 4);

    let scheduler = PublishScheduler::new(executor, queue)
        .with_predicate(healthwatch_core::TagPredicate::all_of(["publish"]))
        .with_metrics(metrics.clone());

    let report = scheduler.run_cycle().await;
    assert_eq!(report.entries().len(), 1);

    let message = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.report_id, report.id());
    assert_eq!(metrics.get_snapshot().cycles_total, 1);
}

#[tokio::test]
async fn test_scheduler_publishes_periodically_until_shutdown() {
    let registry = Registry::new()
        .with_check(
            CheckDescriptor::new("queue"),
            CustomCheck::from_fn(|| Ok("reachable".to_string())),
        )
        .unwrap();
    let executor = HealthExecutor::new(Arc::new(registry));

    let (sink, mut receiver) = ChannelSink::new(16);
    let (queue, _worker) = PublishQueue::start(Publisher::new(Arc::new(sink)), 16);

    let shutdown = tokio_util::sync::CancellationToken::new();
    let handle = PublishScheduler::new(executor, queue)
        .with_delay(Duration::from_millis(10))
        .with_period(Duration::from_millis(50))
        .spawn(shutdown.clone());

    let first = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_ne!(first.report_id, second.report_id);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}
