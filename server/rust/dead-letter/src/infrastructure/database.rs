use serde::Deserialize;

use crate::infrastructure::config::ConfigError;

/// デッドレターテーブルを置く既定のスキーマ。
pub const DEFAULT_SCHEMA: &str = "dlq";

/// `DATABASE_URL` のみが設定されている場合の接続数上限。
pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;

/// DatabaseConfig はデッドレターストア用 PostgreSQL の接続設定。
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub name: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
    #[serde(default = "default_max_open_conns")]
    pub max_open_conns: u32,
    /// `dead_letter_entries` テーブルを作成するスキーマ
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_db_port() -> u16 {
    5432
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_max_open_conns() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.ssl_mode
        )
    }

    /// スキーマ名は SQL に直接埋め込むため、識別子として安全な文字のみ許可する。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_plain_identifier(&self.schema) {
            return Err(ConfigError::Invalid(format!(
                "database.schema must be a plain identifier: {}",
                self.schema
            )));
        }
        if self.max_open_conns == 0 {
            return Err(ConfigError::Invalid(
                "database.max_open_conns must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*` に一致するか。
pub(crate) fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
