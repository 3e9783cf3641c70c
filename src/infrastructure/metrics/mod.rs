//! Key-value backends for the metrics accumulator.
//!
//! Provides a [`MetricsStore`] trait with two implementations:
//! - [`RedisMetricsStore`] - Shared Redis store
//! - [`MemoryMetricsStore`] - Process-local store for tests and Redis-less runs

mod memory_store;
mod redis_store;
mod store;

pub use memory_store::MemoryMetricsStore;
pub use redis_store::RedisMetricsStore;
pub use store::{MetricsError, MetricsResult, MetricsStore};
