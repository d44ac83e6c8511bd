//! Cache store clients.
//!
//! Values are stored as JSON strings behind [`CacheInterface`], with a Redis
//! implementation for deployments and an in-memory one for development and
//! tests.

mod cache_interface;
pub mod cache_keys;
mod memory_cache;
mod redis_cache;

pub use cache_interface::{CacheExt, CacheHealthCheck, CacheInterface};
pub use memory_cache::{InMemoryCacheService, InMemoryCacheServiceParameters};
pub use redis_cache::{RedisCacheService, RedisCacheServiceParameters};
