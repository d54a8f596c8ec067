use std::sync::Arc;

use mailhub_cache::CacheClient;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::entity::cache_key;
use crate::domain::repository::{DeadLetterStore, StoreEvent};

/// StoreEventListener はストアの追加通知を受けて `dlq:total:count` を加算する。
///
/// 取り込み処理が加算する `dlq:total` とは別のカウンターとして扱う。
pub struct StoreEventListener {
    store: Arc<dyn DeadLetterStore>,
    counters: Arc<dyn CacheClient>,
    cancel_token: CancellationToken,
}

impl StoreEventListener {
    /// `counters` にはレートリミット名前空間のクライアントを渡すこと。
    pub fn new(store: Arc<dyn DeadLetterStore>, counters: Arc<dyn CacheClient>) -> Self {
        Self {
            store,
            counters,
            cancel_token: CancellationToken::new(),
        }
    }

    /// 購読を開始する。購読は呼び出し時点で確立されるため、以降の通知は取りこぼさない。
    pub fn start(&self) -> JoinHandle<()> {
        let mut rx = self.store.subscribe();
        let counters = self.counters.clone();
        let token = self.cancel_token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(StoreEvent::Added { id }) => {
                            if let Err(e) = counters.incr(cache_key::TOTAL_COUNT).await {
                                tracing::warn!(entry_id = %id, error = %e, "failed to count added dead letter entry");
                            }
                        }
                        Ok(StoreEvent::Removed { .. }) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped = skipped, "store event listener lagged, counts may be low");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("store event listener stopped");
        })
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
