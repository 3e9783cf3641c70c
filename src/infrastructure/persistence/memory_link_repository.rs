//! In-memory implementation of link repository.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};

use super::pg_link_repository::placeholder_slug;
use crate::domain::entities::{Link, NewLink, PendingLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::slug_codec::SignedSlug;

/// DashMap-backed link store with the same contracts as the PostgreSQL one.
///
/// Counter updates hold the entry's shard lock for the whole
/// compare-and-increment, which makes them atomic per link.
pub struct MemoryLinkRepository {
    links: DashMap<i64, Link>,
    next_id: AtomicI64,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            links: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Returns the stored row, soft-deleted ones included.
    pub fn raw(&self, id: i64) -> Option<Link> {
        self.links.get(&id).map(|l| l.clone())
    }
}

impl Default for MemoryLinkRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn insert_pending(&self, new_link: NewLink) -> Result<PendingLink, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();

        let link = Link {
            id,
            slug: placeholder_slug()?,
            id_b62: String::new(),
            sig: String::new(),
            url: new_link.url.clone(),
            expires_at: new_link.expires_at,
            max_clicks: new_link.max_clicks,
            clicks_count: 0,
            domain_scope: new_link.domain_scope,
            is_banned: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.links.insert(id, link);

        Ok(PendingLink {
            id,
            url: new_link.url,
        })
    }

    async fn finalize(&self, id: i64, signed: &SignedSlug) -> Result<Link, AppError> {
        let taken = self
            .links
            .iter()
            .any(|l| l.id != id && l.slug == signed.slug);
        if taken {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "links_slug_key" }),
            ));
        }

        let mut link = self
            .links
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        link.slug = signed.slug.clone();
        link.id_b62 = signed.id_part.clone();
        link.sig = signed.sig.clone();
        link.updated_at = Utc::now();

        Ok(link.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self
            .links
            .get(&id)
            .filter(|l| !l.is_deleted())
            .map(|l| l.clone()))
    }

    async fn increment_if_below_limit(&self, id: i64) -> Result<u64, AppError> {
        let Some(mut link) = self.links.get_mut(&id) else {
            return Ok(0);
        };

        let below = link.max_clicks.is_none_or(|max| link.clicks_count < max);
        if link.is_deleted() || !below {
            return Ok(0);
        }

        link.clicks_count += 1;
        Ok(1)
    }

    async fn increment(&self, id: i64) -> Result<u64, AppError> {
        match self.links.get_mut(&id) {
            Some(mut link) if !link.is_deleted() => {
                link.clicks_count += 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn ban(&self, id: i64) -> Result<bool, AppError> {
        match self.links.get_mut(&id) {
            Some(mut link) if !link.is_deleted() => {
                link.is_banned = true;
                link.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        match self.links.get_mut(&id) {
            Some(mut link) if !link.is_deleted() => {
                let now = Utc::now();
                link.deleted_at = Some(now);
                link.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }
}
