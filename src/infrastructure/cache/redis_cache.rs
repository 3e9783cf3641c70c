//! Redis-backed link cache.

use super::service::{CacheError, CacheResult, LinkCache, link_key};
use crate::domain::entities::Link;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis link cache storing JSON-encoded links under `link:{id}`.
///
/// Uses a shared `ConnectionManager` for connection reuse.
/// All operations are fail-open: errors are logged but don't propagate to callers.
pub struct RedisLinkCache {
    client: ConnectionManager,
}

impl RedisLinkCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        info!(
            "Connecting to Redis at {}",
            crate::config::mask_connection_string(redis_url)
        );

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self { client: manager })
    }

    /// Returns the underlying connection manager so other Redis-backed
    /// components can share it.
    pub fn connection(&self) -> ConnectionManager {
        self.client.clone()
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn get(&self, id: i64) -> Option<Link> {
        let key = link_key(id);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Link>(&raw) {
                Ok(link) => {
                    debug!("Cache HIT: {}", key);
                    Some(link)
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                None
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", key, e);
                None
            }
        }
    }

    async fn put(&self, link: &Link, ttl_seconds: u64) {
        let key = link_key(link.id);
        let raw = match serde_json::to_string(link) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode link {} for cache: {}", link.id, e);
                return;
            }
        };

        let mut conn = self.client.clone();
        match conn.set_ex::<_, _, ()>(&key, raw, ttl_seconds).await {
            Ok(_) => debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds),
            Err(e) => warn!("Redis SET error for {}: {}", key, e),
        }
    }

    async fn forget(&self, id: i64) {
        let key = link_key(id);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", key);
                }
            }
            Err(e) => warn!("Redis DEL error for {}: {}", key, e),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
