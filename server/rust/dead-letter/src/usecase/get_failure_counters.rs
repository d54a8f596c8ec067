use std::sync::Arc;

use mailhub_cache::{get_json, CacheClient};

use crate::domain::entity::{cache_key, FailureCounters, RetryMarker};
use crate::usecase::FailureTracker;

/// GetFailureCountersUseCase はキャッシュ上のカウンターとリトライ記録を参照する。
pub struct GetFailureCountersUseCase {
    tracker: Arc<FailureTracker>,
    nonces: Arc<dyn CacheClient>,
}

impl GetFailureCountersUseCase {
    pub fn new(tracker: Arc<FailureTracker>, nonces: Arc<dyn CacheClient>) -> Self {
        Self { tracker, nonces }
    }

    /// 2 つの総数カウンターと、指定があればキュー別カウンターを返す。
    pub async fn execute(&self, queue_name: Option<&str>) -> anyhow::Result<FailureCounters> {
        let total = self.tracker.read_counter(cache_key::TOTAL).await?;
        let total_added = self.tracker.read_counter(cache_key::TOTAL_COUNT).await?;
        let queue = match queue_name {
            Some(name) => Some(self.tracker.queue_count(name).await?),
            None => None,
        };

        Ok(FailureCounters {
            total,
            total_added,
            queue,
        })
    }

    /// 元ジョブに対するリトライマーカーが残っているか。
    pub async fn has_retry_marker(&self, original_job_id: &str) -> anyhow::Result<bool> {
        Ok(self
            .nonces
            .exists(&cache_key::retry_marker(original_job_id))
            .await?)
    }

    /// リトライマーカーの内容を取得する。
    pub async fn retry_marker(&self, original_job_id: &str) -> anyhow::Result<Option<RetryMarker>> {
        Ok(get_json(self.nonces.as_ref(), &cache_key::retry_marker(original_job_id)).await?)
    }
}
