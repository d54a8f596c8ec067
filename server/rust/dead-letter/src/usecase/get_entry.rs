use std::sync::Arc;

use crate::domain::entity::DeadLetterEntry;
use crate::domain::repository::DeadLetterStore;

/// GetEntryUseCase はデッドレターエントリの取得を担う。
pub struct GetEntryUseCase {
    store: Arc<dyn DeadLetterStore>,
}

impl GetEntryUseCase {
    pub fn new(store: Arc<dyn DeadLetterStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, id: &str) -> anyhow::Result<Option<DeadLetterEntry>> {
        self.store.get(id).await
    }
}
