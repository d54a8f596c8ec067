use std::sync::Arc;

use crate::domain::entity::RetryOptions;
use crate::usecase::RetryEntryUseCase;

/// RetryBulkUseCase は複数エントリを順番にリトライする。
pub struct RetryBulkUseCase {
    retry_entry_uc: Arc<RetryEntryUseCase>,
}

impl RetryBulkUseCase {
    pub fn new(retry_entry_uc: Arc<RetryEntryUseCase>) -> Self {
        Self { retry_entry_uc }
    }

    /// 成功件数を返す。1 件の失敗で処理を中断しない。
    pub async fn execute(&self, ids: &[String], options: &RetryOptions) -> usize {
        let mut retried = 0usize;
        for id in ids {
            if self.retry_entry_uc.execute(id, options).await {
                retried += 1;
            }
        }

        tracing::info!(
            requested = ids.len(),
            retried = retried,
            "bulk retry completed"
        );
        retried
    }
}
