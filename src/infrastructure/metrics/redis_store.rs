//! Redis-backed metric store.

use super::store::{MetricsError, MetricsResult, MetricsStore};
use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::info;

/// Metric store on a shared Redis connection.
///
/// Counters use `INCRBYFLOAT`/`INCRBY`, indexes use sets, so concurrent
/// writers from any number of processes accumulate without coordination.
pub struct RedisMetricsStore {
    client: ConnectionManager,
}

impl RedisMetricsStore {
    /// Wraps an existing connection manager, checking it with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::ConnectionError`] if the PING fails.
    pub async fn from_manager(manager: ConnectionManager) -> MetricsResult<Self> {
        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| MetricsError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Metrics store connected to Redis");

        Ok(Self { client: manager })
    }
}

fn op_error(op: &str, key: &str, e: redis::RedisError) -> MetricsError {
    MetricsError::OperationError(format!("{} {}: {}", op, key, e))
}

#[async_trait]
impl MetricsStore for RedisMetricsStore {
    async fn incr_by_float(&self, key: &str, delta: f64) -> MetricsResult<()> {
        let mut conn = self.client.clone();
        redis::cmd("INCRBYFLOAT")
            .arg(key)
            .arg(delta)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| op_error("INCRBYFLOAT", key, e))
    }

    async fn incr_by(&self, key: &str, delta: i64) -> MetricsResult<()> {
        let mut conn = self.client.clone();
        conn.incr::<_, _, ()>(key, delta)
            .await
            .map_err(|e| op_error("INCRBY", key, e))
    }

    async fn set_add(&self, key: &str, member: &str) -> MetricsResult<()> {
        let mut conn = self.client.clone();
        conn.sadd::<_, _, ()>(key, member)
            .await
            .map_err(|e| op_error("SADD", key, e))
    }

    async fn set_members(&self, key: &str) -> MetricsResult<Vec<String>> {
        let mut conn = self.client.clone();
        conn.smembers::<_, Vec<String>>(key)
            .await
            .map_err(|e| op_error("SMEMBERS", key, e))
    }

    async fn get(&self, key: &str) -> MetricsResult<Option<String>> {
        let mut conn = self.client.clone();
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| op_error("GET", key, e))
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
