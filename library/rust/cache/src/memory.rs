use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{CacheClient, CacheError};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= Instant::now())
    }
}

/// InMemoryCacheClient はプロセス内で完結するキャッシュ実装。
/// Redis が設定されていない開発環境とテストで使用する。
#[derive(Clone)]
pub struct InMemoryCacheClient {
    store: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryCacheClient {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// 期限切れのエントリを削除する。書き込みロック取得中に呼ぶこと。
fn purge_expired(store: &mut HashMap<String, Entry>) {
    let before = store.len();
    store.retain(|_, entry| !entry.is_expired());
    let purged = before - store.len();
    if purged > 0 {
        tracing::debug!(purged = purged, "expired cache entries purged");
    }
}

impl Default for InMemoryCacheClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheClient for InMemoryCacheClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let store = self.store.read().await;
        match store.get(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        purge_expired(&mut store);
        store.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let store = self.store.read().await;
        Ok(store.get(key).is_some_and(|e| !e.is_expired()))
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        // 書き込みロックを保持したまま読み取りと更新を行うため、プロセス内ではアトミック
        let mut store = self.store.write().await;
        purge_expired(&mut store);
        let (current, expires_at) = match store.get(key) {
            Some(entry) if !entry.is_expired() => {
                let current = entry
                    .value
                    .parse::<i64>()
                    .map_err(|_| CacheError::NotAnInteger {
                        key: key.to_string(),
                    })?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };

        let next = current.checked_add(1).ok_or_else(|| CacheError::Overflow {
            key: key.to_string(),
        })?;
        store.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }
}
