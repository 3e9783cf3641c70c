//! Read-through link cache for fast redirect lookups.
//!
//! Provides a [`LinkCache`] trait with three implementations:
//! - [`RedisLinkCache`] - Production Redis-backed cache
//! - [`MemoryLinkCache`] - Process-local cache
//! - [`NullCache`] - No-op implementation for disabled caching

mod memory_cache;
mod null_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryLinkCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisLinkCache;
pub use service::{CacheError, CacheResult, LinkCache};
