use std::collections::HashMap;
use std::sync::Arc;

use mailhub_cache::{CacheClient, CacheNamespace, InMemoryCacheClient, NamespacedCache, RedisCacheClient};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::domain::entity::{
    CapturedError, DeadLetterEntry, DeadLetterStats, EntryFilter, FailureCounters, RetryOptions,
};
use crate::domain::repository::DeadLetterStore;
use crate::infrastructure::cleanup_scheduler::CleanupScheduler;
use crate::infrastructure::config::{Config, DlqConfig};
use crate::infrastructure::database::{DEFAULT_MAX_CONNECTIONS, DEFAULT_SCHEMA};
use crate::infrastructure::persistence::{InMemoryDeadLetterStore, PostgresDeadLetterStore};
use crate::infrastructure::store_event_listener::StoreEventListener;
use crate::usecase::{
    CaptureFailureInput, CaptureFailureUseCase, CleanOldFailuresUseCase, FailureTracker,
    GetEntryUseCase, GetFailureCountersUseCase, GetStatsUseCase, ListEntriesUseCase,
    RemoveEntryUseCase, RetryBulkUseCase, RetryEntryUseCase,
};

/// DeadLetterService はデッドレター処理の窓口。
///
/// ストアとキャッシュを束ね、取り込み・リトライ・統計・保持期間管理の各ユースケースへ委譲する。
/// バックグラウンドタスク（クリーンアップとストア通知の購読）の起動と停止もここで管理する。
///
/// カウンターはレートリミット名前空間、リトライマーカーはノンス名前空間に書き込む。
pub struct DeadLetterService {
    store: Arc<dyn DeadLetterStore>,
    counters: Arc<dyn CacheClient>,
    config: DlqConfig,
    tracker: Arc<FailureTracker>,
    capture_uc: CaptureFailureUseCase,
    retry_entry_uc: Arc<RetryEntryUseCase>,
    retry_bulk_uc: RetryBulkUseCase,
    remove_entry_uc: RemoveEntryUseCase,
    get_entry_uc: GetEntryUseCase,
    list_entries_uc: ListEntriesUseCase,
    get_stats_uc: GetStatsUseCase,
    clean_uc: Arc<CleanOldFailuresUseCase>,
    counters_uc: GetFailureCountersUseCase,
    lifecycle: Mutex<Lifecycle>,
}

/// バックグラウンドタスクの状態。`Closed` からは戻らない。
enum Lifecycle {
    Idle,
    Running(BackgroundTasks),
    Closed,
}

struct BackgroundTasks {
    scheduler: CleanupScheduler,
    scheduler_handle: JoinHandle<()>,
    listener: StoreEventListener,
    listener_handle: JoinHandle<()>,
}

impl DeadLetterService {
    /// `cache` には名前空間を付与していないクライアントを渡す。
    pub fn new(store: Arc<dyn DeadLetterStore>, cache: Arc<dyn CacheClient>, config: DlqConfig) -> Self {
        let counters: Arc<dyn CacheClient> =
            Arc::new(NamespacedCache::new(cache.clone(), CacheNamespace::RateLimit));
        let nonces: Arc<dyn CacheClient> =
            Arc::new(NamespacedCache::new(cache, CacheNamespace::Nonce));

        let tracker = Arc::new(FailureTracker::new(counters.clone()));
        let retry_entry_uc = Arc::new(RetryEntryUseCase::new(
            store.clone(),
            nonces.clone(),
            config.retry_marker_ttl(),
        ));

        Self {
            capture_uc: CaptureFailureUseCase::new(
                store.clone(),
                tracker.clone(),
                config.alert_threshold,
            ),
            retry_bulk_uc: RetryBulkUseCase::new(retry_entry_uc.clone()),
            retry_entry_uc,
            remove_entry_uc: RemoveEntryUseCase::new(store.clone()),
            get_entry_uc: GetEntryUseCase::new(store.clone()),
            list_entries_uc: ListEntriesUseCase::new(store.clone(), config.scan_limit),
            get_stats_uc: GetStatsUseCase::new(store.clone(), config.scan_limit),
            clean_uc: Arc::new(CleanOldFailuresUseCase::new(store.clone(), config.scan_limit)),
            counters_uc: GetFailureCountersUseCase::new(tracker.clone(), nonces),
            tracker,
            store,
            counters,
            config,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// 設定に従ってストアとキャッシュへ接続し、サービスを構築する。
    ///
    /// データベース未設定ならインメモリストア、Redis 未設定ならインメモリキャッシュを使う。
    pub async fn connect(cfg: &Config) -> anyhow::Result<Self> {
        let database_url = match (&cfg.database, std::env::var("DATABASE_URL")) {
            (_, Ok(url)) => Some(url),
            (Some(db), Err(_)) => Some(db.connection_url()),
            (None, Err(_)) => None,
        };
        let max_connections = cfg
            .database
            .as_ref()
            .map_or(DEFAULT_MAX_CONNECTIONS, |db| db.max_open_conns);
        let schema = cfg
            .database
            .as_ref()
            .map_or(DEFAULT_SCHEMA, |db| db.schema.as_str());

        let store: Arc<dyn DeadLetterStore> = if let Some(url) = database_url {
            info!(schema = %schema, "connecting to database");
            let pool = PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(&url)
                .await?;
            let pg_store = PostgresDeadLetterStore::with_schema(pool, schema);
            pg_store.ensure_schema().await?;
            info!("database connection pool established");
            Arc::new(pg_store)
        } else {
            info!("no database configured, using in-memory dead letter store");
            Arc::new(InMemoryDeadLetterStore::new())
        };

        let cache: Arc<dyn CacheClient> = if let Some(redis_cfg) = &cfg.redis {
            let client = RedisCacheClient::new(&redis_cfg.url).await?;
            info!("redis cache connected");
            Arc::new(client)
        } else {
            info!("no redis configured, using in-memory cache");
            Arc::new(InMemoryCacheClient::new())
        };

        Ok(Self::new(store, cache, cfg.dlq.clone()))
    }

    /// クリーンアップとストア通知の購読を開始する。起動済みなら何もしない。
    ///
    /// `shutdown` 後はストアが閉じているため再起動しない。
    pub async fn start(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        match *lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Running(_) => return,
            Lifecycle::Closed => {
                tracing::warn!("dead letter service already shut down, start ignored");
                return;
            }
        }

        let scheduler = CleanupScheduler::new(
            self.clean_uc.clone(),
            self.config.cleanup_interval(),
            self.config.retention_days,
        );
        let scheduler_handle = scheduler.start();
        let listener = StoreEventListener::new(self.store.clone(), self.counters.clone());
        let listener_handle = listener.start();

        *lifecycle = Lifecycle::Running(BackgroundTasks {
            scheduler,
            scheduler_handle,
            listener,
            listener_handle,
        });
        info!("dead letter service started");
    }

    /// バックグラウンドタスクを停止してからストアを閉じる。2 回目以降は何もしない。
    pub async fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.lifecycle.lock().await, Lifecycle::Closed);
        if let Lifecycle::Closed = previous {
            return;
        }
        if let Lifecycle::Running(tasks) = previous {
            tasks.scheduler.stop();
            tasks.listener.stop();
            if let Err(e) = tasks.scheduler_handle.await {
                tracing::error!(error = %e, "cleanup scheduler task ended abnormally");
            }
            if let Err(e) = tasks.listener_handle.await {
                tracing::error!(error = %e, "store event listener task ended abnormally");
            }
        }
        self.store.close().await;
        info!("dead letter service shut down");
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock().await, Lifecycle::Running(_))
    }

    pub async fn is_closed(&self) -> bool {
        matches!(*self.lifecycle.lock().await, Lifecycle::Closed)
    }

    /// 失敗ジョブを取り込む。失敗しても呼び出し元へはエラーを返さない。
    pub async fn capture_failure(
        &self,
        original_job_id: &str,
        original_queue_name: &str,
        payload: Value,
        error: CapturedError,
        attempts_made: u32,
        metadata: Option<HashMap<String, Value>>,
    ) {
        self.capture_uc
            .execute(CaptureFailureInput {
                original_job_id: original_job_id.to_string(),
                original_queue_name: original_queue_name.to_string(),
                payload,
                error,
                attempts_made,
                metadata: metadata.unwrap_or_default(),
            })
            .await;
    }

    pub async fn retry_job(&self, id: &str, options: &RetryOptions) -> bool {
        self.retry_entry_uc.execute(id, options).await
    }

    /// 成功したリトライの件数を返す。1 件の失敗で処理は中断しない。
    pub async fn retry_bulk(&self, ids: &[String], options: &RetryOptions) -> usize {
        self.retry_bulk_uc.execute(ids, options).await
    }

    pub async fn remove_entry(&self, id: &str) -> anyhow::Result<bool> {
        self.remove_entry_uc.execute(id).await
    }

    pub async fn get_entry(&self, id: &str) -> anyhow::Result<Option<DeadLetterEntry>> {
        self.get_entry_uc.execute(id).await
    }

    pub async fn list_entries(&self, filter: &EntryFilter) -> anyhow::Result<Vec<DeadLetterEntry>> {
        self.list_entries_uc.execute(filter).await
    }

    pub async fn get_stats(&self) -> anyhow::Result<DeadLetterStats> {
        self.get_stats_uc.execute().await
    }

    /// 保持期間を過ぎたエントリを削除し、削除件数を返す。
    pub async fn clean_old_failures(&self, retention_days: u32) -> anyhow::Result<usize> {
        self.clean_uc.execute(retention_days).await
    }

    pub async fn failure_counters(&self, queue_name: Option<&str>) -> anyhow::Result<FailureCounters> {
        self.counters_uc.execute(queue_name).await
    }

    pub async fn has_retry_marker(&self, original_job_id: &str) -> anyhow::Result<bool> {
        self.counters_uc.has_retry_marker(original_job_id).await
    }

    /// キュー別の失敗数が設定済みの閾値に達しているか。
    pub async fn check_alert_threshold(&self, queue_name: &str) -> anyhow::Result<bool> {
        self.tracker
            .check_alert_threshold(queue_name, self.config.alert_threshold)
            .await
    }

    pub fn config(&self) -> &DlqConfig {
        &self.config
    }
}
