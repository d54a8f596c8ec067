pub mod cleanup_scheduler;
pub mod config;
pub mod database;
pub mod logger;
pub mod persistence;
pub mod store_event_listener;
