use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};

use crate::{CacheClient, CacheError};

/// Redis-backed cache client implementation.
///
/// Uses a connection manager so that dropped connections are re-established
/// transparently between commands.
#[derive(Clone)]
pub struct RedisCacheClient {
    conn: ConnectionManager,
}

impl RedisCacheClient {
    /// Create a new RedisCacheClient from a Redis URL.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub async fn new(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(map_redis_error)?;
        let conn = ConnectionManager::new(client).await.map_err(|e| {
            tracing::error!(error = %e, "failed to connect to redis");
            map_redis_error(e)
        })?;
        tracing::debug!("redis connection manager established");
        Ok(Self { conn })
    }

    /// Create a new RedisCacheClient from an existing connection manager.
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheClient for RedisCacheClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let result: Option<String> = conn.get(key).await.map_err(map_redis_error)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let millis = ttl.map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        if millis == 0 {
            conn.set::<_, _, ()>(key, value)
                .await
                .map_err(map_redis_error)?;
        } else {
            conn.pset_ex::<_, _, ()>(key, value, millis)
                .await
                .map_err(map_redis_error)?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await.map_err(map_redis_error)?;
        Ok(exists)
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.conn.clone();
        // INCR はサーバー側でアトミックに実行されるため、複数インスタンスから同時に呼ばれても欠損しない
        let value: i64 = conn.incr(key, 1).await.map_err(|e| {
            tracing::warn!(key = %key, error = %e, "redis INCR failed");
            map_redis_error(e)
        })?;
        Ok(value)
    }
}

fn map_redis_error(err: RedisError) -> CacheError {
    CacheError::ConnectionError(err.to_string())
}
