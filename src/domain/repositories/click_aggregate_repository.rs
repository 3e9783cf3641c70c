//! Repository trait for the hourly click rollup.

use crate::domain::entities::{
    BucketCount, ClickAggregate, ClickAggregateKey, Dimension, HourlyCount,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage for [`ClickAggregate`] rows.
///
/// All time ranges are inclusive at both ends and compare against `ts_hour`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickAggregateRepository: Send + Sync {
    /// Adds one to the row with this key, creating it with `count = 1`.
    ///
    /// Must be a single atomic upsert; concurrent writers to the same key
    /// never lose increments.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn upsert_increment(&self, key: &ClickAggregateKey) -> Result<(), AppError>;

    /// Total count per hour across all dimensions, ordered by hour.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn hourly_series(
        &self,
        link_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HourlyCount>, AppError>;

    /// Summed count per value of one dimension over the range, unsorted and
    /// unfiltered. Country values are returned as stored (empty when unknown).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn breakdown(
        &self,
        link_id: i64,
        dimension: Dimension,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BucketCount>, AppError>;

    /// All rows of one link for one hour.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_hour(
        &self,
        link_id: i64,
        ts_hour: DateTime<Utc>,
    ) -> Result<Vec<ClickAggregate>, AppError>;
}
