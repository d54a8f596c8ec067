use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{CacheClient, CacheError};

/// CacheNamespace はキャッシュキーの論理グループ。
/// 名前空間ごとにキーのプレフィックスが決まり、一括無効化の単位になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// レートリミット・集計カウンター用
    RateLimit,
    /// リプレイ防止ノンス用
    Nonce,
}

impl CacheNamespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimit => "ratelimit",
            Self::Nonce => "nonce",
        }
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// NamespacedCache は内側のクライアントに対して全キーへ `"{namespace}:"` を付与する。
#[derive(Clone)]
pub struct NamespacedCache {
    inner: Arc<dyn CacheClient>,
    namespace: CacheNamespace,
}

impl NamespacedCache {
    pub fn new(inner: Arc<dyn CacheClient>, namespace: CacheNamespace) -> Self {
        Self { inner, namespace }
    }

    pub fn namespace(&self) -> CacheNamespace {
        self.namespace
    }

    /// 名前空間プレフィックス付きのキーを返す。
    pub fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

#[async_trait]
impl CacheClient for NamespacedCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(&self.full_key(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.inner.set(&self.full_key(key), value, ttl).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.exists(&self.full_key(key)).await
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        self.inner.incr(&self.full_key(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryCacheClient;

    #[test]
    fn test_namespace_prefix() {
        let cache = NamespacedCache::new(
            Arc::new(InMemoryCacheClient::new()),
            CacheNamespace::RateLimit,
        );
        assert_eq!(cache.full_key("dlq:total"), "ratelimit:dlq:total");
        assert_eq!(CacheNamespace::Nonce.to_string(), "nonce");
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let shared: Arc<dyn CacheClient> = Arc::new(InMemoryCacheClient::new());
        let counters = NamespacedCache::new(shared.clone(), CacheNamespace::RateLimit);
        let nonces = NamespacedCache::new(shared.clone(), CacheNamespace::Nonce);

        counters.incr("key").await.unwrap();
        assert!(counters.exists("key").await.unwrap());
        assert!(!nonces.exists("key").await.unwrap());
        assert_eq!(
            shared.get("ratelimit:key").await.unwrap(),
            Some("1".to_string())
        );
    }
}
