pub mod dead_letter_in_memory;
pub mod dead_letter_postgres;

pub use dead_letter_in_memory::InMemoryDeadLetterStore;
pub use dead_letter_postgres::PostgresDeadLetterStore;

/// ストア通知チャネルのバッファサイズ。
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 1024;
