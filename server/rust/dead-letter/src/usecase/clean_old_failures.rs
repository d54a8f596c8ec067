use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::repository::DeadLetterStore;

/// CleanOldFailuresUseCase は保持期間を過ぎたエントリを削除する。
pub struct CleanOldFailuresUseCase {
    store: Arc<dyn DeadLetterStore>,
    scan_limit: usize,
}

impl CleanOldFailuresUseCase {
    pub fn new(store: Arc<dyn DeadLetterStore>, scan_limit: usize) -> Self {
        Self { store, scan_limit }
    }

    /// `failed_at` が `now - retention_days` より前のエントリを削除し、削除件数を返す。
    /// 境界ちょうどのエントリは残す。
    pub async fn execute(&self, retention_days: u32) -> anyhow::Result<usize> {
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
        let entries = self.store.list(0, self.scan_limit).await?;

        let mut removed = 0usize;
        for entry in entries.iter().filter(|e| e.failed_at < cutoff) {
            if self.store.remove(&entry.id).await? {
                removed += 1;
            }
        }

        tracing::info!(
            retention_days = retention_days,
            scanned = entries.len(),
            removed = removed,
            "old dead letter entries cleaned"
        );
        Ok(removed)
    }
}
