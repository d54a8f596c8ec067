use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::infrastructure::database::DatabaseConfig;

/// アラート閾値の環境変数名。
pub const ENV_ALERT_THRESHOLD: &str = "DLQ_ALERT_THRESHOLD";
/// クリーンアップ間隔（ミリ秒）の環境変数名。
pub const ENV_CLEANUP_INTERVAL_MS: &str = "DLQ_CLEANUP_INTERVAL_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("設定ファイルを読み込めません: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("設定ファイルの形式が不正です: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("環境変数 {name} の値が不正です: {value}")]
    InvalidEnv { name: String, value: String },
    #[error("設定値が不正です: {0}")]
    Invalid(String),
}

/// Config はアプリケーション全体の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub dlq: DlqConfig,
}

impl Config {
    /// YAML ファイルを読み込み、環境変数による上書きを適用する。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut cfg = Self::from_yaml(&content)?;
        cfg.dlq.apply_env_overrides(|name| std::env::var(name).ok())?;
        cfg.dlq.validate()?;
        if let Some(db) = &cfg.database {
            db.validate()?;
        }
        Ok(cfg)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// AppConfig はアプリケーション設定。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

/// LoggingConfig はログ出力設定。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// "json" または "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

/// RedisConfig は共有キャッシュの接続設定。
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// DlqConfig はデッドレター処理の設定。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DlqConfig {
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: i64,
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// 1 回のスキャンで読み込む最大件数
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,
    #[serde(default = "default_retry_marker_ttl_secs")]
    pub retry_marker_ttl_secs: u64,
}

fn default_alert_threshold() -> i64 {
    10
}

fn default_cleanup_interval_ms() -> u64 {
    86_400_000
}

fn default_retention_days() -> u32 {
    30
}

fn default_scan_limit() -> usize {
    1000
}

fn default_retry_marker_ttl_secs() -> u64 {
    3600
}

impl Default for DlqConfig {
    fn default() -> Self {
        Self {
            alert_threshold: default_alert_threshold(),
            cleanup_interval_ms: default_cleanup_interval_ms(),
            retention_days: default_retention_days(),
            scan_limit: default_scan_limit(),
            retry_marker_ttl_secs: default_retry_marker_ttl_secs(),
        }
    }
}

impl DlqConfig {
    /// 環境変数で閾値とクリーンアップ間隔を上書きする。
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ALERT_THRESHOLD) {
            self.alert_threshold = parse_env(ENV_ALERT_THRESHOLD, &value)?;
        }
        if let Some(value) = lookup(ENV_CLEANUP_INTERVAL_MS) {
            self.cleanup_interval_ms = parse_env(ENV_CLEANUP_INTERVAL_MS, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cleanup_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "dlq.cleanup_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.scan_limit == 0 {
            return Err(ConfigError::Invalid(
                "dlq.scan_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }

    pub fn retry_marker_ttl(&self) -> Duration {
        Duration::from_secs(self.retry_marker_ttl_secs)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
app:
  name: "dead-letter"
  version: "0.1.0"
  environment: "dev"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.app.name, "dead-letter");
        assert!(config.database.is_none());
        assert!(config.redis.is_none());
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.dlq, DlqConfig::default());
    }

    #[test]
    fn test_dlq_defaults() {
        let dlq = DlqConfig::default();
        assert_eq!(dlq.alert_threshold, 10);
        assert_eq!(dlq.cleanup_interval(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(dlq.retention_days, 30);
        assert_eq!(dlq.scan_limit, 1000);
        assert_eq!(dlq.retry_marker_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_config_with_dlq_and_redis() {
        let yaml = r#"
app:
  name: "dead-letter"
logging:
  format: "text"
redis:
  url: "redis://localhost:6379"
dlq:
  alert_threshold: 3
  retention_days: 7
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.logging.format, "text");
        assert_eq!(config.redis.unwrap().url, "redis://localhost:6379");
        assert_eq!(config.dlq.alert_threshold, 3);
        assert_eq!(config.dlq.retention_days, 7);
        assert_eq!(config.dlq.cleanup_interval_ms, 86_400_000);
    }

    #[test]
    fn test_env_overrides() {
        let mut dlq = DlqConfig::default();
        dlq.apply_env_overrides(|name| match name {
            ENV_ALERT_THRESHOLD => Some("25".to_string()),
            ENV_CLEANUP_INTERVAL_MS => Some("60000".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(dlq.alert_threshold, 25);
        assert_eq!(dlq.cleanup_interval_ms, 60_000);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut dlq = DlqConfig::default();
        let err = dlq
            .apply_env_overrides(|name| (name == ENV_ALERT_THRESHOLD).then(|| "ten".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
        assert_eq!(dlq.alert_threshold, 10);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let dlq = DlqConfig {
            cleanup_interval_ms: 0,
            ..DlqConfig::default()
        };
        assert!(dlq.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "app:\n  name: \"dead-letter\"\ndlq:\n  scan_limit: 200\n"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.dlq.scan_limit, 200);
    }

    #[test]
    fn test_load_rejects_unsafe_database_schema() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "app:\n  name: \"dead-letter\"\ndatabase:\n  host: \"localhost\"\n  name: \"mailhub\"\n  user: \"app\"\n  schema: \"dlq;drop\"\n"
        )
        .unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/dead-letter.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
