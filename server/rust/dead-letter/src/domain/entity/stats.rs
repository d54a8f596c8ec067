use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeadLetterEntry, ErrorType};

/// `recent_failures` に含める最大件数。
pub const RECENT_FAILURES_LIMIT: usize = 10;

/// DeadLetterStats はスキャンしたページに対する集計結果。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterStats {
    pub total_failed: usize,
    pub by_queue: HashMap<String, u64>,
    pub by_error_type: HashMap<ErrorType, u64>,
    /// スキャン順の先頭 10 件。失敗時刻順ではない。
    pub recent_failures: Vec<DeadLetterEntry>,
    pub oldest_failure: Option<DateTime<Utc>>,
}

/// EntryFilter はエントリ一覧取得の条件。
/// フィルタを適用した後に `offset` / `limit` でページングする。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    #[serde(default)]
    pub queue_name: Option<String>,
    #[serde(default)]
    pub error_type: Option<ErrorType>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self {
            queue_name: None,
            error_type: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// FailureCounters はキャッシュ上の失敗カウンターのスナップショット。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounters {
    /// 取り込み処理が加算した総数 (`dlq:total`)
    pub total: i64,
    /// ストア追加通知で加算した総数 (`dlq:total:count`)
    pub total_added: i64,
    pub queue: Option<i64>,
}
