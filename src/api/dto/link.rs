//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Link, NewLink};

/// Request to create one signed link.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Destination URL; normalized before it is stored and signed.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// RFC 3339 instant after which the link stops resolving.
    pub expires_at: Option<DateTime<Utc>>,

    /// Maximum number of counted visits.
    #[validate(range(min = 1, message = "Must be at least 1"))]
    pub max_clicks: Option<i64>,

    /// Hosts the destination must belong to.
    pub domain_scope: Option<Vec<String>>,
}

impl From<CreateLinkRequest> for NewLink {
    fn from(req: CreateLinkRequest) -> Self {
        NewLink {
            url: req.url,
            expires_at: req.expires_at,
            max_clicks: req.max_clicks,
            domain_scope: req.domain_scope,
        }
    }
}

/// Body of `201 Created`.
#[derive(Debug, Serialize)]
pub struct CreatedLinkResponse {
    pub id: i64,
    pub slug: String,
    pub short_url: String,
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i64>,
}

impl CreatedLinkResponse {
    pub fn new(link: Link, short_url: String) -> Self {
        Self {
            id: link.id,
            slug: link.slug,
            short_url,
            url: link.url,
            expires_at: link.expires_at,
            max_clicks: link.max_clicks,
        }
    }
}

/// Full view of a link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub slug: String,
    pub short_url: String,
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i64>,
    pub clicks: i64,
    pub is_banned: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LinkResponse {
    pub fn new(link: Link, short_url: String) -> Self {
        Self {
            id: link.id,
            slug: link.slug,
            short_url,
            url: link.url,
            expires_at: link.expires_at,
            max_clicks: link.max_clicks,
            clicks: link.clicks_count,
            is_banned: link.is_banned,
            deleted_at: link.deleted_at,
        }
    }
}
