/// dead-letter integration tests
/// インメモリストアとインメモリキャッシュを使って DeadLetterService の一連の動作を検証する。
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mailhub_cache::{CacheClient, InMemoryCacheClient};
use mailhub_dead_letter::domain::entity::{
    CapturedError, DeadLetterEntry, EntryFilter, ErrorType, RetryOptions,
};
use mailhub_dead_letter::domain::repository::DeadLetterStore;
use mailhub_dead_letter::infrastructure::config::DlqConfig;
use mailhub_dead_letter::infrastructure::persistence::InMemoryDeadLetterStore;
use mailhub_dead_letter::DeadLetterService;

struct Harness {
    service: DeadLetterService,
    store: Arc<InMemoryDeadLetterStore>,
    cache: Arc<InMemoryCacheClient>,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryDeadLetterStore::new());
    let cache = Arc::new(InMemoryCacheClient::new());
    let service = DeadLetterService::new(store.clone(), cache.clone(), DlqConfig::default());
    Harness {
        service,
        store,
        cache,
    }
}

async fn capture(service: &DeadLetterService, job_id: &str, queue: &str, message: &str) {
    service
        .capture_failure(
            job_id,
            queue,
            serde_json::json!({"x": 1}),
            CapturedError::new(message),
            3,
            None,
        )
        .await;
}

fn aged_entry(job_id: &str, days: i64) -> DeadLetterEntry {
    let mut entry = DeadLetterEntry::from_capture(
        job_id,
        "email-sync",
        serde_json::json!({}),
        &CapturedError::new("failed"),
        1,
        HashMap::new(),
        None,
    );
    entry.failed_at = Utc::now() - chrono::Duration::days(days);
    entry
}

#[tokio::test]
async fn test_capture_then_stats() {
    let h = harness();
    capture(&h.service, "job-1", "queueA", "Request timeout").await;

    let stats = h.service.get_stats().await.unwrap();
    assert_eq!(stats.total_failed, 1);
    assert_eq!(stats.by_queue.get("queueA"), Some(&1));
    assert_eq!(stats.by_error_type.get(&ErrorType::Timeout), Some(&1));
    assert_eq!(stats.recent_failures.len(), 1);
    assert_eq!(
        stats.oldest_failure,
        Some(stats.recent_failures[0].failed_at)
    );

    let entry = h.service.get_entry("dlq-job-1").await.unwrap().unwrap();
    assert_eq!(entry.original_job_id, "job-1");
    assert_eq!(entry.original_payload, serde_json::json!({"x": 1}));
    assert_eq!(entry.attempts_made, 3);
    assert_eq!(entry.failure_count, 1);
    assert_eq!(entry.metadata.get("error_name"), Some(&serde_json::json!("Error")));
    assert!(entry.metadata.contains_key("captured_at"));
}

#[tokio::test]
async fn test_recapture_replaces_entry() {
    let h = harness();
    capture(&h.service, "job-1", "queueA", "Request timeout").await;
    capture(&h.service, "job-1", "queueA", "ECONNREFUSED").await;

    assert_eq!(h.store.len().await, 1);
    let entry = h.service.get_entry("dlq-job-1").await.unwrap().unwrap();
    assert_eq!(entry.failure_count, 2);
    assert_eq!(entry.last_error, "ECONNREFUSED");

    let stats = h.service.get_stats().await.unwrap();
    assert_eq!(stats.by_error_type.get(&ErrorType::Network), Some(&1));
    assert_eq!(stats.by_error_type.get(&ErrorType::Timeout), None);
}

#[tokio::test]
async fn test_sequential_captures_count_failures() {
    let h = harness();
    for _ in 0..5 {
        capture(&h.service, "job-7", "queueA", "boom").await;
    }

    assert_eq!(h.store.len().await, 1);
    let entry = h.service.get_entry("dlq-job-7").await.unwrap().unwrap();
    assert_eq!(entry.failure_count, 5);
}

#[tokio::test]
async fn test_caller_metadata_is_kept() {
    let h = harness();
    let mut metadata = HashMap::new();
    metadata.insert("account_id".to_string(), serde_json::json!("acc-1"));
    metadata.insert("error_name".to_string(), serde_json::json!("caller"));

    h.service
        .capture_failure(
            "job-1",
            "queueA",
            serde_json::json!({}),
            CapturedError::new("boom").with_name("SyncError"),
            1,
            Some(metadata),
        )
        .await;

    let entry = h.service.get_entry("dlq-job-1").await.unwrap().unwrap();
    assert_eq!(entry.metadata.get("account_id"), Some(&serde_json::json!("acc-1")));
    assert_eq!(
        entry.metadata.get("error_name"),
        Some(&serde_json::json!("SyncError"))
    );
}

#[tokio::test]
async fn test_retry_unknown_returns_false() {
    let h = harness();
    assert!(!h.service.retry_job("dlq-unknown", &RetryOptions::default()).await);
}

#[tokio::test]
async fn test_retry_bulk_continues_past_missing() {
    let h = harness();
    capture(&h.service, "job-1", "queueA", "boom").await;
    capture(&h.service, "job-2", "queueA", "boom").await;

    let ids = vec![
        "dlq-job-1".to_string(),
        "dlq-missing".to_string(),
        "dlq-job-2".to_string(),
    ];
    let options = RetryOptions {
        requested_by: Some("operator".to_string()),
        ..RetryOptions::default()
    };
    assert_eq!(h.service.retry_bulk(&ids, &options).await, 2);

    assert!(h.store.is_empty().await);
    assert!(h.service.has_retry_marker("job-1").await.unwrap());
    assert!(h.service.has_retry_marker("job-2").await.unwrap());
    assert!(!h.service.has_retry_marker("missing").await.unwrap());
}

#[tokio::test]
async fn test_clean_old_failures() {
    let h = harness();
    h.store.upsert(&aged_entry("job-old", 31)).await.unwrap();
    h.store.upsert(&aged_entry("job-new", 5)).await.unwrap();

    assert_eq!(h.service.clean_old_failures(30).await.unwrap(), 1);
    assert!(h.service.get_entry("dlq-job-old").await.unwrap().is_none());
    assert!(h.service.get_entry("dlq-job-new").await.unwrap().is_some());
}

#[tokio::test]
async fn test_empty_stats() {
    let h = harness();
    let stats = h.service.get_stats().await.unwrap();
    assert_eq!(stats.total_failed, 0);
    assert!(stats.by_queue.is_empty());
    assert!(stats.by_error_type.is_empty());
    assert!(stats.recent_failures.is_empty());
    assert!(stats.oldest_failure.is_none());
}

#[tokio::test]
async fn test_list_entries_paginates_after_filter() {
    let h = harness();
    capture(&h.service, "job-1", "A", "boom").await;
    capture(&h.service, "job-2", "B", "boom").await;
    capture(&h.service, "job-3", "A", "boom").await;

    let filter = EntryFilter {
        queue_name: Some("A".to_string()),
        limit: 1,
        offset: 1,
        ..EntryFilter::default()
    };
    let entries = h.service.list_entries(&filter).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "dlq-job-3");
}

#[tokio::test]
async fn test_list_entries_by_error_type() {
    let h = harness();
    capture(&h.service, "job-1", "A", "401 Unauthorized").await;
    capture(&h.service, "job-2", "A", "Request timeout").await;

    let filter = EntryFilter {
        error_type: Some(ErrorType::Authentication),
        ..EntryFilter::default()
    };
    let entries = h.service.list_entries(&filter).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "dlq-job-1");
}

#[tokio::test]
async fn test_remove_entry() {
    let h = harness();
    capture(&h.service, "job-1", "A", "boom").await;

    assert!(h.service.remove_entry("dlq-job-1").await.unwrap());
    assert!(!h.service.remove_entry("dlq-job-1").await.unwrap());
    assert!(!h.service.has_retry_marker("job-1").await.unwrap());
}

#[tokio::test]
async fn test_two_total_counters() {
    let h = harness();
    h.service.start().await;

    capture(&h.service, "job-1", "A", "boom").await;
    capture(&h.service, "job-1", "A", "boom").await;
    capture(&h.service, "job-2", "B", "boom").await;

    let mut counters = h.service.failure_counters(Some("A")).await.unwrap();
    for _ in 0..100 {
        if counters.total_added == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        counters = h.service.failure_counters(Some("A")).await.unwrap();
    }
    assert_eq!(counters.total, 3);
    assert_eq!(counters.total_added, 3);
    assert_eq!(counters.queue, Some(2));

    h.service.shutdown().await;
}

#[tokio::test]
async fn test_alert_threshold_reached() {
    let h = harness();
    for i in 0..10 {
        capture(&h.service, &format!("job-{i}"), "A", "boom").await;
    }
    assert!(h.service.check_alert_threshold("A").await.unwrap());
    assert_eq!(
        h.cache.get("ratelimit:dlq:queue:A").await.unwrap().as_deref(),
        Some("10")
    );
}

#[tokio::test]
async fn test_shutdown_stops_background_tasks() {
    let h = harness();
    h.service.start().await;
    assert!(h.service.is_running().await);

    h.service.shutdown().await;
    assert!(!h.service.is_running().await);

    // 停止後の追加はカウントされない
    capture(&h.service, "job-1", "A", "boom").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let counters = h.service.failure_counters(None).await.unwrap();
    assert_eq!(counters.total, 1);
    assert_eq!(counters.total_added, 0);
}
