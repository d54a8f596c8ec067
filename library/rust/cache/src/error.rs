use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("キャッシュ値が整数ではありません: {key}")]
    NotAnInteger { key: String },
    #[error("キャッシュ値が上限を超えます: {key}")]
    Overflow { key: String },
    #[error("シリアライズエラー: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("接続エラー: {0}")]
    ConnectionError(String),
}
