use crate::domain::entity::ErrorType;

/// 分類ルール。上から順に評価し、最初に一致したものを採用する。
/// パターンは小文字で記述し、メッセージ側も小文字化して部分一致で比較する。
const RULES: &[(&[&str], ErrorType)] = &[
    (&["timeout"], ErrorType::Timeout),
    (&["network", "econnrefused", "enotfound"], ErrorType::Network),
    (&["unauthorized", "authentication", "401"], ErrorType::Authentication),
    (&["forbidden", "403"], ErrorType::Authorization),
    (&["not found", "404"], ErrorType::NotFound),
    (&["rate limit", "429"], ErrorType::RateLimit),
    (&["validation", "invalid"], ErrorType::Validation),
    (&["database", "sql"], ErrorType::Database),
    (&["redis"], ErrorType::Cache),
];

/// ErrorClassifier はエラーメッセージを固定の分類体系へ割り当てるドメインサービス。
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// メッセージを分類する。どのルールにも一致しなければ `Unknown`。
    pub fn classify(message: &str) -> ErrorType {
        let lowered = message.to_lowercase();
        RULES
            .iter()
            .find(|(patterns, _)| patterns.iter().any(|p| lowered.contains(p)))
            .map_or(ErrorType::Unknown, |(_, label)| *label)
    }
}
