//! End-to-end runs of the retrieval pipeline against a scripted service.

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::client::ScriptedQueryClient;
use shared::config::SessionConfig;
use shared::driver::{Driver, DriverError, DriverState};
use shared::export::read_export;
use shared::models::RawLogRecord;
use shared::poll::Sleeper;
use shared::query::{QueryResults, QueryStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counts sleeps instead of waiting.
#[derive(Debug, Clone, Default)]
struct CountingSleeper {
    sleeps: Arc<AtomicUsize>,
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, duration: Duration) {
        assert_eq!(duration, Duration::from_secs(1));
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

fn record(timestamp: &str, body: &Value) -> RawLogRecord {
    RawLogRecord::from_message(timestamp, body.to_string())
}

#[tokio::test]
async fn test_session_export_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let first = json!({
        "traceId": "0af7651916cd43dd8448eb211c80319c",
        "spanId": "b7ad6b7169203331",
        "name": "POST /checkout",
        "kind": "SERVER",
        "durationNano": 1_500_000,
        "status": {"code": "OK"},
        "attributes": {"session.id": "sess-1", "note": "n".repeat(300)},
        "resource": {"service.name": "shop"}
    });
    let second = json!({
        "traceId": "0af7651916cd43dd8448eb211c80319c",
        "spanId": "00f067aa0ba902b7",
        "parentSpanId": "b7ad6b7169203331",
        "name": "SELECT orders",
        "kind": "CLIENT",
        "events": [{"name": "retry", "attributes": {"attempt": 2}}],
        "links": [{"traceId": "4bf92f3577b34da6a3ce929d0e0e4736", "spanId": "00f067aa0ba902b8"}]
    });

    let client = ScriptedQueryClient::new("q-e2e").with_responses([
        QueryResults::pending(QueryStatus::Scheduled),
        QueryResults::pending(QueryStatus::Running),
        QueryResults::pending(QueryStatus::Running),
        QueryResults::complete(vec![
            record("2024-06-01 10:00:00.000", &first),
            RawLogRecord::from_message("2024-06-01 10:00:00.500", "{\"truncated\": "),
            record("2024-06-01 10:00:01.000", &second),
        ]),
    ]);
    let sleeper = CountingSleeper::default();
    let config = SessionConfig::new("sess-1").with_output_dir(dir.path());

    let mut driver = Driver::new(client.clone(), sleeper.clone());
    let mut out = Vec::new();
    let summary = driver.run(&config, &mut out).await.unwrap();
    let report = String::from_utf8(out).unwrap();

    assert_eq!(driver.state(), DriverState::Done);
    assert_eq!(client.poll_count(), 4);
    assert_eq!(sleeper.sleeps.load(Ordering::SeqCst), 3);

    assert!(report.starts_with("Query started: q-e2e\n"));
    assert!(report.contains("Found 3 spans"));
    assert!(report.contains("SPAN 1"));
    assert!(report.contains("Duration: 1.50 ms"));
    assert!(report.contains(&format!("  • note: {}...\n", "n".repeat(200))));
    assert!(report.contains("Span 2: Unable to parse span data"));
    assert!(report.contains("Raw: {\"truncated\": "));
    assert!(report.contains("SPAN 3"));
    assert!(report.contains("Parent Span ID: b7ad6b7169203331"));
    assert!(report.contains("Links (1):"));
    assert!(report.trim_end().ends_with(&format!(
        "Exported full details to: {}",
        summary.export_path.display()
    )));

    assert_eq!(
        summary.export_path,
        dir.path().join("session_sess-1_full.json")
    );
    let document = read_export(&summary.export_path).unwrap();
    assert_eq!(document.session_id, "sess-1");
    assert_eq!(document.span_count, 3);
    assert_eq!(document.spans, vec![first, second]);
}

#[tokio::test]
async fn test_failed_query_leaves_no_export() {
    let dir = tempfile::tempdir().unwrap();
    let client = ScriptedQueryClient::new("q-fail")
        .with_statuses([QueryStatus::Running, QueryStatus::Failed]);
    let config = SessionConfig::new("sess-2").with_output_dir(dir.path());

    let mut driver = Driver::new(client, CountingSleeper::default());
    let mut out = Vec::new();
    let err = driver.run(&config, &mut out).await.unwrap_err();

    assert!(matches!(err, DriverError::QueryFailed { .. }));
    assert_eq!(driver.state(), DriverState::Failed);
    assert!(!config.export_path().exists());
    assert!(String::from_utf8(out).unwrap().contains("Query failed: failed"));
}
