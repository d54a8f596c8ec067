//! PostgreSQL ストア統合テスト
//! 実行には PostgreSQL が必要:
//!   DATABASE_URL="postgres://..." cargo test -- --ignored
//!
//! テスト対象: PostgresDeadLetterStore の置換・スキャン順・削除と追加通知。
//! スキーマは `ensure_schema` が作成する。

use std::collections::HashMap;

use chrono::Utc;
use mailhub_dead_letter::domain::entity::{CapturedError, DeadLetterEntry};
use mailhub_dead_letter::domain::repository::{DeadLetterStore, StoreEvent};
use mailhub_dead_letter::infrastructure::persistence::PostgresDeadLetterStore;
use sqlx::postgres::PgPoolOptions;

async fn connect() -> PostgresDeadLetterStore {
    let url = std::env::var("DATABASE_URL").unwrap();
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();
    let store = PostgresDeadLetterStore::new(pool);
    store.ensure_schema().await.unwrap();
    store
}

/// 実行ごとに衝突しないジョブ ID を作る。
fn unique_job_id(label: &str) -> String {
    format!(
        "it-{label}-{}",
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn entry(job_id: &str, previous: Option<&DeadLetterEntry>, message: &str) -> DeadLetterEntry {
    let mut metadata = HashMap::new();
    metadata.insert("source".to_string(), serde_json::json!("integration"));
    DeadLetterEntry::from_capture(
        job_id,
        "email-sync",
        serde_json::json!({"account": "acc-1"}),
        &CapturedError::new(message).with_stack("stack trace"),
        2,
        metadata,
        previous,
    )
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_replaces_whole_entry() {
    let store = connect().await;
    let job_id = unique_job_id("replace");

    let first = entry(&job_id, None, "Request timeout");
    store.upsert(&first).await.unwrap();
    let second = entry(&job_id, Some(&first), "ECONNREFUSED");
    store.upsert(&second).await.unwrap();

    let found = store.get(&second.id).await.unwrap().unwrap();
    assert_eq!(found.failure_count, 2);
    assert_eq!(found.last_error, "ECONNREFUSED");
    assert_eq!(found.error_stack.as_deref(), Some("stack trace"));
    assert_eq!(found.metadata.get("source"), Some(&serde_json::json!("integration")));

    assert!(store.remove(&second.id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_replaced_entry_moves_to_end_of_scan() {
    let store = connect().await;
    let job_a = unique_job_id("order-a");
    let job_b = unique_job_id("order-b");

    let a = entry(&job_a, None, "boom");
    store.upsert(&a).await.unwrap();
    store.upsert(&entry(&job_b, None, "boom")).await.unwrap();
    store.upsert(&entry(&job_a, Some(&a), "boom")).await.unwrap();

    let ids: Vec<String> = store
        .list(0, 10_000)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .filter(|id| id.contains("-order-"))
        .collect();
    let pos_a = ids.iter().position(|id| id.ends_with(&job_a)).unwrap();
    let pos_b = ids.iter().position(|id| id.ends_with(&job_b)).unwrap();
    assert!(pos_b < pos_a);

    store.remove(&DeadLetterEntry::id_for(&job_a)).await.unwrap();
    store.remove(&DeadLetterEntry::id_for(&job_b)).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_remove_missing_returns_false() {
    let store = connect().await;
    let id = DeadLetterEntry::id_for(&unique_job_id("missing"));
    assert!(!store.remove(&id).await.unwrap());
    assert!(store.get(&id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_publishes_added_event() {
    let store = connect().await;
    let mut rx = store.subscribe();
    let job_id = unique_job_id("event");
    let e = entry(&job_id, None, "boom");

    store.upsert(&e).await.unwrap();
    assert_eq!(rx.recv().await.unwrap(), StoreEvent::Added { id: e.id.clone() });

    store.remove(&e.id).await.unwrap();
    assert_eq!(rx.recv().await.unwrap(), StoreEvent::Removed { id: e.id });
    store.close().await;
}
