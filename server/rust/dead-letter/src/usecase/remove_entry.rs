use std::sync::Arc;

use crate::domain::repository::DeadLetterStore;

/// RemoveEntryUseCase はリトライせずにエントリを削除する。
pub struct RemoveEntryUseCase {
    store: Arc<dyn DeadLetterStore>,
}

impl RemoveEntryUseCase {
    pub fn new(store: Arc<dyn DeadLetterStore>) -> Self {
        Self { store }
    }

    /// 削除した場合は true、存在しなかった場合は false。
    pub async fn execute(&self, id: &str) -> anyhow::Result<bool> {
        let removed = self.store.remove(id).await?;
        if removed {
            tracing::info!(entry_id = %id, "dead letter entry removed");
        }
        Ok(removed)
    }
}
