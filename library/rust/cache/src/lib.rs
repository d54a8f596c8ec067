pub mod client;
pub mod error;
pub mod json;
pub mod memory;
pub mod namespace;
#[cfg(feature = "redis")]
pub mod redis;

pub use client::CacheClient;
pub use error::CacheError;
pub use json::{get_json, set_json};
pub use memory::InMemoryCacheClient;
pub use namespace::{CacheNamespace, NamespacedCache};

#[cfg(feature = "redis")]
pub use self::redis::RedisCacheClient;

#[cfg(feature = "mock")]
pub use client::MockCacheClient;
