//! Process-local metric store.

use super::store::{MetricsResult, MetricsStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeSet;

/// In-memory metric store used by tests and single-instance deployments
/// without Redis.
///
/// Each increment runs under the shard lock of its own entry, so writers to
/// the same key serialize and never lose updates.
#[derive(Default)]
pub struct MemoryMetricsStore {
    values: DashMap<String, f64>,
    sets: DashMap<String, BTreeSet<String>>,
}

impl MemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsStore for MemoryMetricsStore {
    async fn incr_by_float(&self, key: &str, delta: f64) -> MetricsResult<()> {
        *self.values.entry(key.to_string()).or_insert(0.0) += delta;
        Ok(())
    }

    async fn incr_by(&self, key: &str, delta: i64) -> MetricsResult<()> {
        *self.values.entry(key.to_string()).or_insert(0.0) += delta as f64;
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> MetricsResult<()> {
        self.sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_members(&self, key: &str) -> MetricsResult<Vec<String>> {
        Ok(self
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, key: &str) -> MetricsResult<Option<String>> {
        Ok(self.values.get(key).map(|v| v.to_string()))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_increments_accumulate() {
        let store = MemoryMetricsStore::new();
        store.incr_by_float("a", 0.5).await.unwrap();
        store.incr_by_float("a", 0.25).await.unwrap();
        store.incr_by("b", 2).await.unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("0.75"));
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sets_deduplicate() {
        let store = MemoryMetricsStore::new();
        store.set_add("s", "x").await.unwrap();
        store.set_add("s", "x").await.unwrap();
        store.set_add("s", "y").await.unwrap();

        assert_eq!(store.set_members("s").await.unwrap(), vec!["x", "y"]);
        assert!(store.set_members("none").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryMetricsStore::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    store.incr_by("hits", 1).await.unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.get("hits").await.unwrap().as_deref(), Some("1600"));
    }
}
