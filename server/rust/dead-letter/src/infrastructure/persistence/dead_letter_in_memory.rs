use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::domain::entity::DeadLetterEntry;
use crate::domain::repository::{DeadLetterStore, StoreEvent};

use super::EVENT_CHANNEL_CAPACITY;

/// InMemoryDeadLetterStore は開発環境・テスト用のストア。
/// スキャン順は最後に書き込まれた順（置換されたエントリは末尾へ移動する）。
pub struct InMemoryDeadLetterStore {
    entries: RwLock<Vec<DeadLetterEntry>>,
    events: broadcast::Sender<StoreEvent>,
}

impl InMemoryDeadLetterStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(Vec::new()),
            events,
        }
    }

    /// 保持しているエントリ数を返す。
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryDeadLetterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeadLetterStore for InMemoryDeadLetterStore {
    async fn upsert(&self, entry: &DeadLetterEntry) -> anyhow::Result<()> {
        {
            let mut entries = self.entries.write().await;
            entries.retain(|e| e.id != entry.id);
            entries.push(entry.clone());
        }
        // 購読者がいなければ送信は失敗するが、通知は任意なので無視する
        let _ = self.events.send(StoreEvent::Added {
            id: entry.id.clone(),
        });
        Ok(())
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<DeadLetterEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn list(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<DeadLetterEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn remove(&self, id: &str) -> anyhow::Result<bool> {
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|e| e.id != id);
            entries.len() != before
        };
        if removed {
            let _ = self.events.send(StoreEvent::Removed { id: id.to_string() });
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    async fn close(&self) {}
}
