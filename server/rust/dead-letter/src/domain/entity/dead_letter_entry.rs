use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// デッドレター ID のプレフィックス。`"dlq-" + original_job_id` で重複排除キーになる。
pub const DEAD_LETTER_ID_PREFIX: &str = "dlq-";

/// CapturedError は取り込み時点のエラー情報。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedError {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl CapturedError {
    /// メッセージのみのエラーを作成する。
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "Error".to_string(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl From<&anyhow::Error> for CapturedError {
    fn from(err: &anyhow::Error) -> Self {
        // 原因チェーン全体を診断情報として保持する
        Self {
            name: "Error".to_string(),
            message: err.to_string(),
            stack: Some(format!("{err:?}")),
        }
    }
}

/// DeadLetterEntry は永続的に失敗したジョブ 1 件分の記録。
///
/// 同じ `original_job_id` の取り込みは常にエントリ全体を置き換える。
/// 過去の失敗履歴は `failure_count` 以外には残らない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub id: String,
    pub original_job_id: String,
    pub original_queue_name: String,
    pub original_payload: serde_json::Value,
    pub failed_at: DateTime<Utc>,
    pub attempts_made: u32,
    pub last_error: String,
    pub error_stack: Option<String>,
    pub failure_count: u32,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl DeadLetterEntry {
    /// 元ジョブ ID から決定的なデッドレター ID を導出する。
    pub fn id_for(original_job_id: &str) -> String {
        format!("{DEAD_LETTER_ID_PREFIX}{original_job_id}")
    }

    /// 取り込み内容からエントリを組み立てる。
    ///
    /// `previous` があればその `failure_count` に 1 を加え、なければ 1 から始める。
    /// それ以外のフィールドは全て今回の取り込み内容で上書きする。
    pub fn from_capture(
        original_job_id: &str,
        original_queue_name: &str,
        original_payload: serde_json::Value,
        error: &CapturedError,
        attempts_made: u32,
        metadata: HashMap<String, serde_json::Value>,
        previous: Option<&DeadLetterEntry>,
    ) -> Self {
        let now = Utc::now();
        let failure_count = previous.map_or(1, |p| p.failure_count.saturating_add(1));

        let mut merged = metadata;
        merged.insert(
            "error_name".to_string(),
            serde_json::Value::String(error.name.clone()),
        );
        merged.insert(
            "captured_at".to_string(),
            serde_json::Value::String(now.to_rfc3339()),
        );

        Self {
            id: Self::id_for(original_job_id),
            original_job_id: original_job_id.to_string(),
            original_queue_name: original_queue_name.to_string(),
            original_payload,
            failed_at: now,
            attempts_made,
            last_error: error.message.clone(),
            error_stack: error.stack.clone(),
            failure_count,
            metadata: merged,
        }
    }
}
