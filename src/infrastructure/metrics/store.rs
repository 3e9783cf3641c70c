//! Metric store trait and error types.

use async_trait::async_trait;

/// Errors raised by a metric store backend.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Metrics store connection error: {0}")]
    ConnectionError(String),
    #[error("Metrics store operation error: {0}")]
    OperationError(String),
}

/// Result type for metric store operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Atomic key-value primitives the metrics accumulator is built on.
///
/// Every write must be an atomic increment or set insertion so that any
/// number of concurrent writers can target the same key. Unlike the link
/// cache, failures are reported to the caller.
///
/// # Implementations
///
/// - [`crate::infrastructure::metrics::RedisMetricsStore`] - Redis-backed store
/// - [`crate::infrastructure::metrics::MemoryMetricsStore`] - Process-local store
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Adds a float delta to the value at `key`, starting from zero.
    async fn incr_by_float(&self, key: &str, delta: f64) -> MetricsResult<()>;

    /// Adds an integer delta to the value at `key`, starting from zero.
    async fn incr_by(&self, key: &str, delta: i64) -> MetricsResult<()>;

    /// Adds `member` to the set at `key`.
    async fn set_add(&self, key: &str, member: &str) -> MetricsResult<()>;

    /// Returns all members of the set at `key`, empty when it does not exist.
    async fn set_members(&self, key: &str) -> MetricsResult<Vec<String>>;

    /// Returns the raw value at `key`.
    async fn get(&self, key: &str) -> MetricsResult<Option<String>>;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;
}
