use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::broadcast;

use crate::domain::entity::DeadLetterEntry;
use crate::domain::repository::{DeadLetterStore, StoreEvent};
use crate::infrastructure::database::{is_plain_identifier, DEFAULT_SCHEMA};

use super::EVENT_CHANNEL_CAPACITY;

/// PostgresDeadLetterStore は PostgreSQL をバックエンドとするストア。
/// スキャン順は最後に書き込まれた順（`enqueued_at`）。
pub struct PostgresDeadLetterStore {
    pool: PgPool,
    schema: String,
    events: broadcast::Sender<StoreEvent>,
}

impl PostgresDeadLetterStore {
    /// 既定の `dlq` スキーマを使う。
    pub fn new(pool: PgPool) -> Self {
        Self::with_schema(pool, DEFAULT_SCHEMA)
    }

    /// 指定したスキーマにテーブルを置く。
    ///
    /// スキーマ名は SQL に埋め込むため、識別子として安全でない名前は既定値に置き換える。
    pub fn with_schema(pool: PgPool, schema: &str) -> Self {
        let schema = if is_plain_identifier(schema) {
            schema.to_string()
        } else {
            tracing::warn!(schema = %schema, "invalid schema name, falling back to default");
            DEFAULT_SCHEMA.to_string()
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pool,
            schema,
            events,
        }
    }

    pub fn table(&self) -> String {
        format!("{}.dead_letter_entries", self.schema)
    }

    /// スキーマとテーブルが無ければ作成する。
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        let table = self.table();
        let statements = [
            format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id                  TEXT PRIMARY KEY,
                    original_job_id     TEXT NOT NULL,
                    original_queue_name TEXT NOT NULL,
                    original_payload    JSONB NOT NULL,
                    failed_at           TIMESTAMPTZ NOT NULL,
                    attempts_made       INTEGER NOT NULL,
                    last_error          TEXT NOT NULL,
                    error_stack         TEXT,
                    failure_count       INTEGER NOT NULL,
                    metadata            JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                    enqueued_at         TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_dead_letter_entries_enqueued_at ON {table} (enqueued_at, id)"
            ),
        ];
        for statement in &statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DeadLetterStore for PostgresDeadLetterStore {
    async fn upsert(&self, entry: &DeadLetterEntry) -> anyhow::Result<()> {
        // 部分更新は行わず、全カラムを置き換える
        sqlx::query(&format!(
            r#"
            INSERT INTO {}
                (id, original_job_id, original_queue_name, original_payload, failed_at,
                 attempts_made, last_error, error_stack, failure_count, metadata, enqueued_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, clock_timestamp())
            ON CONFLICT (id) DO UPDATE
            SET original_job_id = EXCLUDED.original_job_id,
                original_queue_name = EXCLUDED.original_queue_name,
                original_payload = EXCLUDED.original_payload,
                failed_at = EXCLUDED.failed_at,
                attempts_made = EXCLUDED.attempts_made,
                last_error = EXCLUDED.last_error,
                error_stack = EXCLUDED.error_stack,
                failure_count = EXCLUDED.failure_count,
                metadata = EXCLUDED.metadata,
                enqueued_at = EXCLUDED.enqueued_at
            "#,
            self.table()
        ))
        .bind(&entry.id)
        .bind(&entry.original_job_id)
        .bind(&entry.original_queue_name)
        .bind(&entry.original_payload)
        .bind(entry.failed_at)
        .bind(i32::try_from(entry.attempts_made)?)
        .bind(&entry.last_error)
        .bind(&entry.error_stack)
        .bind(i32::try_from(entry.failure_count)?)
        .bind(Json(&entry.metadata))
        .execute(&self.pool)
        .await?;

        let _ = self.events.send(StoreEvent::Added {
            id: entry.id.clone(),
        });
        Ok(())
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<DeadLetterEntry>> {
        let row = sqlx::query_as::<_, DeadLetterEntryRow>(&format!(
            r#"
            SELECT id, original_job_id, original_queue_name, original_payload, failed_at,
                   attempts_made, last_error, error_stack, failure_count, metadata
            FROM {}
            WHERE id = $1
            "#,
            self.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<DeadLetterEntry>> {
        let rows = sqlx::query_as::<_, DeadLetterEntryRow>(&format!(
            r#"
            SELECT id, original_job_id, original_queue_name, original_payload, failed_at,
                   attempts_made, last_error, error_stack, failure_count, metadata
            FROM {}
            ORDER BY enqueued_at ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
            self.table()
        ))
        .bind(i64::try_from(limit)?)
        .bind(i64::try_from(offset)?)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn remove(&self, id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            let _ = self.events.send(StoreEvent::Removed { id: id.to_string() });
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// DeadLetterEntryRow はDB行からのマッピング用。
#[derive(sqlx::FromRow)]
struct DeadLetterEntryRow {
    id: String,
    original_job_id: String,
    original_queue_name: String,
    original_payload: serde_json::Value,
    failed_at: chrono::DateTime<chrono::Utc>,
    attempts_made: i32,
    last_error: String,
    error_stack: Option<String>,
    failure_count: i32,
    metadata: Json<HashMap<String, serde_json::Value>>,
}

impl TryFrom<DeadLetterEntryRow> for DeadLetterEntry {
    type Error = anyhow::Error;

    fn try_from(row: DeadLetterEntryRow) -> anyhow::Result<Self> {
        Ok(DeadLetterEntry {
            id: row.id,
            original_job_id: row.original_job_id,
            original_queue_name: row.original_queue_name,
            original_payload: row.original_payload,
            failed_at: row.failed_at,
            attempts_made: u32::try_from(row.attempts_made)?,
            last_error: row.last_error,
            error_stack: row.error_stack,
            failure_count: u32::try_from(row.failure_count)?,
            metadata: row.metadata.0,
        })
    }
}
