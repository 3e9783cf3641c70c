//! Link cache trait and error types.

use crate::domain::entities::Link;
use async_trait::async_trait;
use std::fmt;

/// Errors that can occur while setting up a cache backend.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache setup.
pub type CacheResult<T> = Result<T, CacheError>;

/// Read-through cache of links keyed by id.
///
/// The cache is advisory: it may serve a copy up to one TTL old and is never
/// consulted for quota decisions. All operations are fail-open; backend
/// errors are logged and look like a miss.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisLinkCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::MemoryLinkCache`] - Process-local cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// Returns the cached link, or `None` on miss, expiry or backend error.
    async fn get(&self, id: i64) -> Option<Link>;

    /// Stores a copy of the link for `ttl_seconds`.
    async fn put(&self, link: &Link, ttl_seconds: u64);

    /// Removes the cached copy, if any.
    async fn forget(&self, id: i64);

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}

/// Cache key of a link.
pub(crate) fn link_key(id: i64) -> String {
    format!("link:{}", id)
}
