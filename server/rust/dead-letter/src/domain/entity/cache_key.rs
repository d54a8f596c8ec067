//! デッドレター関連のキャッシュキー。
//! 既存デプロイとの互換性のため、キー文字列は変更しないこと。

use super::ErrorType;

/// 取り込み処理が加算する総失敗数（レートリミット名前空間）。
pub const TOTAL: &str = "dlq:total";

/// ストアの追加通知で加算する総件数（レートリミット名前空間）。
/// `TOTAL` とは独立したカウンター。
pub const TOTAL_COUNT: &str = "dlq:total:count";

pub fn queue(queue_name: &str) -> String {
    format!("dlq:queue:{queue_name}")
}

pub fn error(error_type: ErrorType) -> String {
    format!("dlq:error:{error_type}")
}

/// リトライマーカー（ノンス名前空間）。
pub fn retry_marker(original_job_id: &str) -> String {
    format!("retry:{original_job_id}")
}
