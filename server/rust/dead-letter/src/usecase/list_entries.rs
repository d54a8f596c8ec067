use std::sync::Arc;

use crate::domain::entity::{DeadLetterEntry, EntryFilter};
use crate::domain::repository::DeadLetterStore;
use crate::domain::service::ErrorClassifier;

/// ListEntriesUseCase は条件に一致するエントリ一覧を返す。
pub struct ListEntriesUseCase {
    store: Arc<dyn DeadLetterStore>,
    scan_limit: usize,
}

impl ListEntriesUseCase {
    pub fn new(store: Arc<dyn DeadLetterStore>, scan_limit: usize) -> Self {
        Self { store, scan_limit }
    }

    /// スキャンしたページをフィルタしてから offset / limit を適用する。
    pub async fn execute(&self, filter: &EntryFilter) -> anyhow::Result<Vec<DeadLetterEntry>> {
        let entries = self.store.list(0, self.scan_limit).await?;

        Ok(entries
            .into_iter()
            .filter(|e| {
                filter
                    .queue_name
                    .as_ref()
                    .map_or(true, |q| &e.original_queue_name == q)
            })
            .filter(|e| {
                filter
                    .error_type
                    .map_or(true, |t| ErrorClassifier::classify(&e.last_error) == t)
            })
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }
}
