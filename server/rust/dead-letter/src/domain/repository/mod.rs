pub mod dead_letter_store;

pub use dead_letter_store::{DeadLetterStore, StoreEvent};
