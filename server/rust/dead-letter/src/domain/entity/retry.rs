use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RetryOptions はオペレーターがリトライ時に指定するオプション。
/// 内容は監査用にリトライマーカーへ記録するだけで、ここでは解釈しない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
}

/// RetryMarker はリトライ実施の記録。`retry:{original_job_id}` に TTL 付きで保存する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryMarker {
    pub retried_at: DateTime<Utc>,
    pub retried_from: String,
    pub options: RetryOptions,
}
