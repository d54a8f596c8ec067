use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::usecase::CleanOldFailuresUseCase;

/// CleanupScheduler は保持期間を過ぎたエントリを一定間隔で削除するバックグラウンドタスク。
///
/// 1 回の実行が失敗・パニックしても次回の実行は継続する。
/// `stop` を呼ぶと次回以降の実行は行われない。
pub struct CleanupScheduler {
    clean_uc: Arc<CleanOldFailuresUseCase>,
    interval: Duration,
    retention_days: u32,
    cancel_token: CancellationToken,
}

impl CleanupScheduler {
    pub fn new(
        clean_uc: Arc<CleanOldFailuresUseCase>,
        interval: Duration,
        retention_days: u32,
    ) -> Self {
        Self {
            clean_uc,
            interval,
            retention_days,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn start(&self) -> JoinHandle<()> {
        let clean_uc = self.clean_uc.clone();
        let interval = self.interval;
        let retention_days = self.retention_days;
        let token = self.cancel_token.clone();

        tracing::info!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            retention_days = retention_days,
            "dead letter cleanup scheduled"
        );

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(interval) => {
                        Self::tick(&clean_uc, retention_days).await;
                    }
                }
            }
            tracing::info!("dead letter cleanup stopped");
        })
    }

    async fn tick(clean_uc: &Arc<CleanOldFailuresUseCase>, retention_days: u32) {
        // 別タスクで実行し、パニックしてもループ側に波及させない
        let uc = clean_uc.clone();
        let result = tokio::spawn(async move { uc.execute(retention_days).await }).await;
        match result {
            Ok(Ok(removed)) => {
                tracing::debug!(removed = removed, "dead letter cleanup tick completed");
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "dead letter cleanup tick failed");
            }
            Err(e) => {
                tracing::error!(error = %e, "dead letter cleanup tick panicked");
            }
        }
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
