pub mod cache_key;
pub mod dead_letter_entry;
pub mod error_type;
pub mod retry;
pub mod stats;

pub use dead_letter_entry::{CapturedError, DeadLetterEntry};
pub use error_type::ErrorType;
pub use retry::{RetryMarker, RetryOptions};
pub use stats::{DeadLetterStats, EntryFilter, FailureCounters};
