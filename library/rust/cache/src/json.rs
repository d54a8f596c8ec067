//! JSON 値をキャッシュに読み書きするヘルパー。
//! `CacheClient` をトレイトオブジェクトとして扱えるよう、ジェネリックな操作はトレイト外に置く。

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{CacheClient, CacheError};

/// 値を JSON にシリアライズして保存する。
pub async fn set_json<T>(
    cache: &dyn CacheClient,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), CacheError>
where
    T: Serialize + Sync,
{
    let raw = serde_json::to_string(value)?;
    cache.set(key, &raw, ttl).await
}

/// JSON として保存された値を取得する。キーが存在しなければ `None`。
pub async fn get_json<T>(cache: &dyn CacheClient, key: &str) -> Result<Option<T>, CacheError>
where
    T: DeserializeOwned,
{
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}
