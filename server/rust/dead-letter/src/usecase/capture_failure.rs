use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entity::{CapturedError, DeadLetterEntry};
use crate::domain::repository::DeadLetterStore;
use crate::domain::service::ErrorClassifier;
use crate::usecase::FailureTracker;

/// CaptureFailureInput は取り込み対象の失敗ジョブ。
#[derive(Debug, Clone)]
pub struct CaptureFailureInput {
    pub original_job_id: String,
    pub original_queue_name: String,
    pub payload: serde_json::Value,
    pub error: CapturedError,
    pub attempts_made: u32,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// CaptureFailureUseCase は失敗ジョブをデッドレターストアへ取り込む。
///
/// 同じジョブの取り込みは「取得してから置換」の 2 段階で行い、トランザクションにはしない。
/// 同一ジョブの同時取り込みでは `failure_count` が過少になりうるが、
/// 決定的 ID によりエントリは常に 1 件に保たれる。
pub struct CaptureFailureUseCase {
    store: Arc<dyn DeadLetterStore>,
    tracker: Arc<FailureTracker>,
    alert_threshold: i64,
}

impl CaptureFailureUseCase {
    pub fn new(
        store: Arc<dyn DeadLetterStore>,
        tracker: Arc<FailureTracker>,
        alert_threshold: i64,
    ) -> Self {
        Self {
            store,
            tracker,
            alert_threshold,
        }
    }

    /// 失敗を取り込む。エラーは呼び出し元へ返さず、ログに記録して握りつぶす。
    pub async fn execute(&self, input: CaptureFailureInput) {
        let job_id = input.original_job_id.clone();
        let queue_name = input.original_queue_name.clone();
        if let Err(e) = self.try_capture(input).await {
            tracing::error!(
                original_job_id = %job_id,
                queue = %queue_name,
                error = %e,
                "failed to capture job failure into dead letter store"
            );
        }
    }

    async fn try_capture(&self, input: CaptureFailureInput) -> anyhow::Result<DeadLetterEntry> {
        let id = DeadLetterEntry::id_for(&input.original_job_id);
        let previous = self.store.get(&id).await?;

        let entry = DeadLetterEntry::from_capture(
            &input.original_job_id,
            &input.original_queue_name,
            input.payload,
            &input.error,
            input.attempts_made,
            input.metadata,
            previous.as_ref(),
        );
        self.store.upsert(&entry).await?;

        let error_type = ErrorClassifier::classify(&entry.last_error);
        tracing::info!(
            entry_id = %entry.id,
            queue = %entry.original_queue_name,
            error_type = %error_type,
            failure_count = entry.failure_count,
            attempts_made = entry.attempts_made,
            "job failure captured"
        );

        self.tracker
            .record_failure(&entry.original_queue_name, error_type)
            .await?;
        self.tracker
            .check_alert_threshold(&entry.original_queue_name, self.alert_threshold)
            .await?;

        Ok(entry)
    }
}
