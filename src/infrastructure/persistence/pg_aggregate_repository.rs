//! PostgreSQL implementation of the click rollup repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{
    BucketCount, ClickAggregate, ClickAggregateKey, DeviceClass, Dimension, HourlyCount,
};
use crate::domain::repositories::ClickAggregateRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct AggregateRow {
    link_id: i64,
    ts_hour: DateTime<Utc>,
    referrer_domain: String,
    country_code: String,
    device_class: String,
    count: i64,
}

impl From<AggregateRow> for ClickAggregate {
    fn from(r: AggregateRow) -> Self {
        ClickAggregate {
            key: ClickAggregateKey {
                link_id: r.link_id,
                ts_hour: r.ts_hour,
                referrer_domain: r.referrer_domain,
                country_code: r.country_code,
                device_class: DeviceClass::from_db(&r.device_class),
            },
            count: r.count,
        }
    }
}

fn dimension_column(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Referrer => "referrer_domain",
        Dimension::Country => "country_code",
        Dimension::Device => "device_class",
    }
}

/// PostgreSQL repository for the `clicks_agg` rollup table.
pub struct PgClickAggregateRepository {
    pool: Arc<PgPool>,
}

impl PgClickAggregateRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickAggregateRepository for PgClickAggregateRepository {
    async fn upsert_increment(&self, key: &ClickAggregateKey) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO clicks_agg (link_id, ts_hour, referrer_domain, country_code, device_class, count)
            VALUES ($1, $2, $3, $4, $5, 1)
            ON CONFLICT (link_id, ts_hour, referrer_domain, country_code, device_class)
            DO UPDATE SET count = clicks_agg.count + 1
            "#,
        )
        .bind(key.link_id)
        .bind(key.ts_hour)
        .bind(&key.referrer_domain)
        .bind(&key.country_code)
        .bind(key.device_class.as_str())
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn hourly_series(
        &self,
        link_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HourlyCount>, AppError> {
        let rows = sqlx::query_as::<_, (DateTime<Utc>, i64)>(
            r#"
            SELECT ts_hour, SUM(count)::BIGINT
            FROM clicks_agg
            WHERE link_id = $1 AND ts_hour BETWEEN $2 AND $3
            GROUP BY ts_hour
            ORDER BY ts_hour
            "#,
        )
        .bind(link_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(ts_hour, count)| HourlyCount { ts_hour, count })
            .collect())
    }

    async fn breakdown(
        &self,
        link_id: i64,
        dimension: Dimension,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BucketCount>, AppError> {
        let column = dimension_column(dimension);
        let sql = format!(
            r#"
            SELECT {column}::TEXT, SUM(count)::BIGINT
            FROM clicks_agg
            WHERE link_id = $1 AND ts_hour BETWEEN $2 AND $3
            GROUP BY {column}
            "#
        );

        let rows = sqlx::query_as::<_, (String, i64)>(&sql)
            .bind(link_id)
            .bind(from)
            .bind(to)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(bucket, count)| BucketCount { bucket, count })
            .collect())
    }

    async fn find_hour(
        &self,
        link_id: i64,
        ts_hour: DateTime<Utc>,
    ) -> Result<Vec<ClickAggregate>, AppError> {
        let rows = sqlx::query_as::<_, AggregateRow>(
            r#"
            SELECT link_id, ts_hour, referrer_domain, country_code, device_class, count
            FROM clicks_agg
            WHERE link_id = $1 AND ts_hour = $2
            ORDER BY count DESC, device_class, referrer_domain, country_code
            "#,
        )
        .bind(link_id)
        .bind(ts_hour)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(ClickAggregate::from).collect())
    }
}
