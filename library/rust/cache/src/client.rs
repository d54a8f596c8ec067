use async_trait::async_trait;
use std::time::Duration;

use crate::CacheError;

/// CacheClient はネットワーク越しの共有キャッシュに対する操作を表す。
///
/// 複数プロセスから同じキャッシュを共有する前提のため、カウンターの更新には
/// 読み取り・書き込みを分けずに `incr` を使うこと。
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// キーの整数値をアトミックに 1 加算し、加算後の値を返す。
    /// キーが存在しない場合は 0 から加算する。
    async fn incr(&self, key: &str) -> Result<i64, CacheError>;
}
