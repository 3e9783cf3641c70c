//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, NewLink, PendingLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::slug_codec::SignedSlug;

const LINK_COLUMNS: &str = "id, slug, id_b62, sig, url, expires_at, max_clicks, clicks_count, \
                            domain_scope, is_banned, created_at, updated_at, deleted_at";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    slug: String,
    id_b62: String,
    sig: String,
    url: String,
    expires_at: Option<DateTime<Utc>>,
    max_clicks: Option<i64>,
    clicks_count: i64,
    domain_scope: Option<Vec<String>>,
    is_banned: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link {
            id: r.id,
            slug: r.slug,
            id_b62: r.id_b62,
            sig: r.sig,
            url: r.url,
            expires_at: r.expires_at,
            max_clicks: r.max_clicks,
            clicks_count: r.clicks_count,
            domain_scope: r.domain_scope,
            is_banned: r.is_banned,
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

/// Random slug reserved for a row until its signed slug is written.
pub(crate) fn placeholder_slug() -> Result<String, AppError> {
    let mut buffer = [0u8; 8];
    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate placeholder slug",
            json!({ "reason": e.to_string() }),
        )
    })?;
    Ok(format!("tmp_{}", hex::encode(buffer)))
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Uses bound parameters throughout; counter updates are single conditional
/// `UPDATE` statements.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert_pending(&self, new_link: NewLink) -> Result<PendingLink, AppError> {
        let (id, url) = sqlx::query_as::<_, (i64, String)>(
            r#"
            INSERT INTO links (slug, url, expires_at, max_clicks, domain_scope)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, url
            "#,
        )
        .bind(placeholder_slug()?)
        .bind(&new_link.url)
        .bind(new_link.expires_at)
        .bind(new_link.max_clicks)
        .bind(&new_link.domain_scope)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(PendingLink { id, url })
    }

    async fn finalize(&self, id: i64, signed: &SignedSlug) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET slug = $2, id_b62 = $3, sig = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .bind(&signed.slug)
            .bind(&signed.id_part)
            .bind(&signed.sig)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Link::from)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1 AND deleted_at IS NULL");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn increment_if_below_limit(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET clicks_count = clicks_count + 1
            WHERE id = $1
              AND deleted_at IS NULL
              AND (max_clicks IS NULL OR clicks_count < max_clicks)
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn increment(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE links SET clicks_count = clicks_count + 1 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn ban(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET is_banned = TRUE, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
