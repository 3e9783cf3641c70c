//! In-memory implementation of the click rollup repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;

use crate::domain::entities::{
    BucketCount, ClickAggregate, ClickAggregateKey, Dimension, HourlyCount,
};
use crate::domain::repositories::ClickAggregateRepository;
use crate::error::AppError;

/// DashMap-backed rollup keyed by the full composite key.
#[derive(Default)]
pub struct MemoryClickAggregateRepository {
    rows: DashMap<ClickAggregateKey, i64>,
}

impl MemoryClickAggregateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn in_range<'a>(
        &'a self,
        link_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = (ClickAggregateKey, i64)> + 'a {
        self.rows.iter().filter_map(move |entry| {
            let key = entry.key();
            (key.link_id == link_id && key.ts_hour >= from && key.ts_hour <= to)
                .then(|| (key.clone(), *entry.value()))
        })
    }
}

#[async_trait]
impl ClickAggregateRepository for MemoryClickAggregateRepository {
    async fn upsert_increment(&self, key: &ClickAggregateKey) -> Result<(), AppError> {
        *self.rows.entry(key.clone()).or_insert(0) += 1;
        Ok(())
    }

    async fn hourly_series(
        &self,
        link_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HourlyCount>, AppError> {
        let mut by_hour: HashMap<DateTime<Utc>, i64> = HashMap::new();
        for (key, count) in self.in_range(link_id, from, to) {
            *by_hour.entry(key.ts_hour).or_insert(0) += count;
        }

        let mut series: Vec<HourlyCount> = by_hour
            .into_iter()
            .map(|(ts_hour, count)| HourlyCount { ts_hour, count })
            .collect();
        series.sort_by_key(|h| h.ts_hour);
        Ok(series)
    }

    async fn breakdown(
        &self,
        link_id: i64,
        dimension: Dimension,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BucketCount>, AppError> {
        let mut by_bucket: HashMap<String, i64> = HashMap::new();
        for (key, count) in self.in_range(link_id, from, to) {
            let bucket = match dimension {
                Dimension::Referrer => key.referrer_domain,
                Dimension::Country => key.country_code,
                Dimension::Device => key.device_class.as_str().to_string(),
            };
            *by_bucket.entry(bucket).or_insert(0) += count;
        }

        Ok(by_bucket
            .into_iter()
            .map(|(bucket, count)| BucketCount { bucket, count })
            .collect())
    }

    async fn find_hour(
        &self,
        link_id: i64,
        ts_hour: DateTime<Utc>,
    ) -> Result<Vec<ClickAggregate>, AppError> {
        let mut rows: Vec<ClickAggregate> = self
            .in_range(link_id, ts_hour, ts_hour)
            .map(|(key, count)| ClickAggregate { key, count })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        Ok(rows)
    }
}
