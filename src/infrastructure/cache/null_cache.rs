//! No-op cache implementation for testing or disabled caching.

use super::service::LinkCache;
use crate::domain::entities::Link;
use async_trait::async_trait;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Used when Redis is unavailable or caching is explicitly disabled; every
/// read goes to the repository.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for NullCache {
    async fn get(&self, _id: i64) -> Option<Link> {
        None
    }

    async fn put(&self, _link: &Link, _ttl_seconds: u64) {}

    async fn forget(&self, _id: i64) {}

    async fn health_check(&self) -> bool {
        true
    }
}
