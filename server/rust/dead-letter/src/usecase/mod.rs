pub mod capture_failure;
pub mod clean_old_failures;
pub mod failure_tracker;
pub mod get_entry;
pub mod get_failure_counters;
pub mod get_stats;
pub mod list_entries;
pub mod remove_entry;
pub mod retry_bulk;
pub mod retry_entry;

pub use capture_failure::{CaptureFailureInput, CaptureFailureUseCase};
pub use clean_old_failures::CleanOldFailuresUseCase;
pub use failure_tracker::FailureTracker;
pub use get_entry::GetEntryUseCase;
pub use get_failure_counters::GetFailureCountersUseCase;
pub use get_stats::GetStatsUseCase;
pub use list_entries::ListEntriesUseCase;
pub use remove_entry::RemoveEntryUseCase;
pub use retry_bulk::RetryBulkUseCase;
pub use retry_entry::RetryEntryUseCase;
