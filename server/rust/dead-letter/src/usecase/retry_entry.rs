use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mailhub_cache::{set_json, CacheClient};

use crate::domain::entity::{cache_key, RetryMarker, RetryOptions};
use crate::domain::repository::DeadLetterStore;

/// RetryEntryUseCase はデッドレターエントリのリトライを担う。
///
/// リトライマーカーを記録してエントリを削除するだけで、元のキューへの再投入は行わない。
/// 再投入は呼び出し元または別プロセスの責務。
pub struct RetryEntryUseCase {
    store: Arc<dyn DeadLetterStore>,
    nonces: Arc<dyn CacheClient>,
    marker_ttl: Duration,
}

impl RetryEntryUseCase {
    /// `nonces` にはノンス名前空間のクライアントを渡すこと。
    pub fn new(
        store: Arc<dyn DeadLetterStore>,
        nonces: Arc<dyn CacheClient>,
        marker_ttl: Duration,
    ) -> Self {
        Self {
            store,
            nonces,
            marker_ttl,
        }
    }

    /// エントリをリトライする。エントリが無い場合や内部エラー時は false。
    pub async fn execute(&self, id: &str, options: &RetryOptions) -> bool {
        match self.try_retry(id, options).await {
            Ok(retried) => retried,
            Err(e) => {
                tracing::error!(entry_id = %id, error = %e, "failed to retry dead letter entry");
                false
            }
        }
    }

    async fn try_retry(&self, id: &str, options: &RetryOptions) -> anyhow::Result<bool> {
        let Some(entry) = self.store.get(id).await? else {
            tracing::warn!(entry_id = %id, "dead letter entry not found for retry");
            return Ok(false);
        };

        let marker = RetryMarker {
            retried_at: Utc::now(),
            retried_from: entry.id.clone(),
            options: options.clone(),
        };
        set_json(
            self.nonces.as_ref(),
            &cache_key::retry_marker(&entry.original_job_id),
            &marker,
            Some(self.marker_ttl),
        )
        .await?;

        self.store.remove(&entry.id).await?;

        tracing::info!(
            entry_id = %entry.id,
            original_job_id = %entry.original_job_id,
            queue = %entry.original_queue_name,
            "dead letter entry retried"
        );
        Ok(true)
    }
}
