pub mod domain;
pub mod infrastructure;
pub mod service;
pub mod usecase;

pub use service::DeadLetterService;
