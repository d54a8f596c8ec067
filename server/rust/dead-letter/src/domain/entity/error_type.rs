use serde::{Deserialize, Serialize};

/// ErrorType はエラーメッセージの分類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorType {
    Timeout,
    Network,
    Authentication,
    Authorization,
    NotFound,
    RateLimit,
    Validation,
    Database,
    Cache,
    Unknown,
}

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "Timeout",
            Self::Network => "Network",
            Self::Authentication => "Authentication",
            Self::Authorization => "Authorization",
            Self::NotFound => "NotFound",
            Self::RateLimit => "RateLimit",
            Self::Validation => "Validation",
            Self::Database => "Database",
            Self::Cache => "Cache",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
