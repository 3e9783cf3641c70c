//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink, PendingLink};
use crate::error::AppError;
use crate::utils::slug_codec::SignedSlug;
use async_trait::async_trait;

/// Source of truth for links.
///
/// Counter updates are single atomic statements: callers never read, compare
/// and write back `clicks_count` themselves.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - In-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a link row under a random placeholder slug.
    ///
    /// The returned [`PendingLink`] carries the generated id, which the caller
    /// signs before calling [`LinkRepository::finalize`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert_pending(&self, new_link: NewLink) -> Result<PendingLink, AppError>;

    /// Writes the signed slug of a pending link and returns the full row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no row has this id.
    /// Returns [`AppError::Conflict`] if the slug is already taken.
    async fn finalize(&self, id: i64, signed: &SignedSlug) -> Result<Link, AppError>;

    /// Finds a live link by id. Soft-deleted rows are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Increments `clicks_count` only while it is below `max_clicks`.
    ///
    /// Returns the number of affected rows: `1` when the click was counted,
    /// `0` when the quota is already exhausted (or the link is gone).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_if_below_limit(&self, id: i64) -> Result<u64, AppError>;

    /// Increments `clicks_count` unconditionally. Returns affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment(&self, id: i64) -> Result<u64, AppError>;

    /// Marks a live link as banned.
    ///
    /// Returns `Ok(false)` if the link does not exist or is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn ban(&self, id: i64) -> Result<bool, AppError>;

    /// Soft-deletes a link by setting `deleted_at = now()`.
    ///
    /// Returns `Ok(false)` if not found or already deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn soft_delete(&self, id: i64) -> Result<bool, AppError>;

    /// Checks that the backing store answers.
    async fn health_check(&self) -> bool;
}
