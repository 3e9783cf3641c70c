//! Process-local link cache.

use super::service::LinkCache;
use crate::domain::entities::Link;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// In-memory link cache with per-entry expiry.
///
/// Expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryLinkCache {
    entries: DashMap<i64, (Link, Instant)>,
}

impl MemoryLinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LinkCache for MemoryLinkCache {
    async fn get(&self, id: i64) -> Option<Link> {
        let hit = self.entries.get(&id).and_then(|entry| {
            let (link, deadline) = entry.value();
            (Instant::now() < *deadline).then(|| link.clone())
        });

        if hit.is_none() {
            self.entries
                .remove_if(&id, |_, (_, deadline)| Instant::now() >= *deadline);
        }
        hit
    }

    async fn put(&self, link: &Link, ttl_seconds: u64) {
        let deadline = Instant::now() + Duration::from_secs(ttl_seconds);
        self.entries.insert(link.id, (link.clone(), deadline));
    }

    async fn forget(&self, id: i64) {
        self.entries.remove(&id);
    }

    async fn health_check(&self) -> bool {
        true
    }
}
