use std::sync::Arc;

use crate::domain::entity::stats::RECENT_FAILURES_LIMIT;
use crate::domain::entity::DeadLetterStats;
use crate::domain::repository::DeadLetterStore;
use crate::domain::service::ErrorClassifier;

/// GetStatsUseCase はデッドレターストアの集計を返す。
pub struct GetStatsUseCase {
    store: Arc<dyn DeadLetterStore>,
    scan_limit: usize,
}

impl GetStatsUseCase {
    pub fn new(store: Arc<dyn DeadLetterStore>, scan_limit: usize) -> Self {
        Self { store, scan_limit }
    }

    /// スキャンした 1 ページ分を集計する。ストアのエラーはそのまま返す。
    ///
    /// `recent_failures` はスキャン順の先頭から取り、失敗時刻では並べ替えない。
    /// `oldest_failure` は全件の `failed_at` の最小値。
    pub async fn execute(&self) -> anyhow::Result<DeadLetterStats> {
        let entries = self.store.list(0, self.scan_limit).await?;

        let mut stats = DeadLetterStats {
            total_failed: entries.len(),
            ..Default::default()
        };

        for entry in &entries {
            *stats
                .by_queue
                .entry(entry.original_queue_name.clone())
                .or_insert(0) += 1;
            *stats
                .by_error_type
                .entry(ErrorClassifier::classify(&entry.last_error))
                .or_insert(0) += 1;

            if stats.recent_failures.len() < RECENT_FAILURES_LIMIT {
                stats.recent_failures.push(entry.clone());
            }

            stats.oldest_failure = Some(match stats.oldest_failure {
                Some(oldest) if oldest <= entry.failed_at => oldest,
                _ => entry.failed_at,
            });
        }

        Ok(stats)
    }
}
