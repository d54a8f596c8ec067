use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::entity::DeadLetterEntry;

/// StoreEvent はストアが書き込み後に発行する通知。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// エントリが追加または置換された
    Added { id: String },
    /// エントリが削除された
    Removed { id: String },
}

/// DeadLetterStore はデッドレターエントリを ID で保持する永続ストア。
///
/// キーによる記録の保管庫として使い、ワークキューとしては扱わない。
/// ストアから自動で再配信するコンシューマーを接続してはならない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    /// 存在しなければ追加し、存在すればエントリ全体を置き換える。
    async fn upsert(&self, entry: &DeadLetterEntry) -> anyhow::Result<()>;

    /// ID でエントリを取得する。
    async fn get(&self, id: &str) -> anyhow::Result<Option<DeadLetterEntry>>;

    /// スキャン順に `offset` から最大 `limit` 件を返す。
    async fn list(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<DeadLetterEntry>>;

    /// エントリを削除する。削除した場合は true。
    async fn remove(&self, id: &str) -> anyhow::Result<bool>;

    /// 書き込み通知を購読する。
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;

    /// 接続を閉じる。
    async fn close(&self);
}
