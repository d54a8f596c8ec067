use std::sync::Arc;

use mailhub_cache::CacheClient;

use crate::domain::entity::{cache_key, ErrorType};

/// FailureTracker は共有キャッシュ上の失敗カウンターを管理する。
///
/// カウンターは全て `incr` で更新し、読み取りと書き込みを分けない。
/// `counters` にはレートリミット名前空間のクライアントを渡すこと。
pub struct FailureTracker {
    counters: Arc<dyn CacheClient>,
}

impl FailureTracker {
    pub fn new(counters: Arc<dyn CacheClient>) -> Self {
        Self { counters }
    }

    /// 総数・キュー別・エラー種別の 3 つのカウンターを加算する。
    pub async fn record_failure(
        &self,
        queue_name: &str,
        error_type: ErrorType,
    ) -> anyhow::Result<()> {
        self.counters.incr(cache_key::TOTAL).await?;
        self.counters.incr(&cache_key::queue(queue_name)).await?;
        self.counters.incr(&cache_key::error(error_type)).await?;
        Ok(())
    }

    /// キュー別カウンターが閾値以上かを判定する。
    ///
    /// 閾値に達した場合は警告ログを出力する。通知の配送はここでは行わない。
    pub async fn check_alert_threshold(
        &self,
        queue_name: &str,
        threshold: i64,
    ) -> anyhow::Result<bool> {
        let count = self.queue_count(queue_name).await?;
        let reached = count >= threshold;
        if reached {
            tracing::warn!(
                queue = %queue_name,
                count = count,
                threshold = threshold,
                "dead letter alert threshold reached"
            );
        }
        Ok(reached)
    }

    /// キュー別カウンターの現在値。未作成なら 0。
    pub async fn queue_count(&self, queue_name: &str) -> anyhow::Result<i64> {
        self.read_counter(&cache_key::queue(queue_name)).await
    }

    pub(crate) async fn read_counter(&self, key: &str) -> anyhow::Result<i64> {
        match self.counters.get(key).await? {
            Some(raw) => Ok(raw.trim().parse()?),
            None => Ok(0),
        }
    }
}
