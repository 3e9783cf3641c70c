//! Link entity and its two-phase construction types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A signed short link.
///
/// `slug == id_b62 ++ sig`, where `sig` signs both the id and the stored `url`.
/// `clicks_count` never exceeds `max_clicks` when a bound is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub slug: String,
    pub id_b62: String,
    pub sig: String,
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i64>,
    pub clicks_count: i64,
    /// Allowed destination domains, checked only when the link is created.
    pub domain_scope: Option<Vec<String>>,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Returns true if the link has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if `now` is strictly past the expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now > e)
    }

    /// Numeric id as used by the slug codec.
    pub fn codec_id(&self) -> u64 {
        self.id as u64
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i64>,
    pub domain_scope: Option<Vec<String>>,
}

/// A link row that has an id but no signed slug yet.
///
/// Produced by the first phase of creation; the signature depends on the
/// generated id, so the row is finalized in a second write.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLink {
    pub id: i64,
    pub url: String,
}
