//! Range queries over the click rollup with k-anonymity suppression.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;

use crate::domain::entities::{BucketCount, Dimension, HourlyCount, truncate_to_hour};
use crate::domain::repositories::{ClickAggregateRepository, LinkRepository};
use crate::error::AppError;

/// Default k-anonymity threshold.
pub const DEFAULT_K_ANON: i64 = 5;

/// Country bucket label for clicks without a resolved country.
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// Look-back window of a stats query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatsRange {
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl StatsRange {
    /// Parses a range selector; anything other than `1d` or `30d` is a week.
    pub fn parse(selector: Option<&str>) -> Self {
        match selector.map(str::trim) {
            Some("1d") => StatsRange::Day,
            Some("30d") => StatsRange::Month,
            _ => StatsRange::Week,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            StatsRange::Day => 1,
            StatsRange::Week => 7,
            StatsRange::Month => 30,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatsRange::Day => "1d",
            StatsRange::Week => "7d",
            StatsRange::Month => "30d",
        }
    }

    /// Inclusive `[from, to]` window ending at the hour containing `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let to = truncate_to_hour(now);
        (to - Duration::days(self.days()), to)
    }
}

/// Aggregated statistics of one link.
///
/// `series` is never suppressed; breakdown buckets below `k` are dropped,
/// so breakdown totals may be lower than the series total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStatsReport {
    pub link_id: i64,
    pub range: StatsRange,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub k: i64,
    pub series: Vec<HourlyCount>,
    pub by_referrer: Vec<BucketCount>,
    pub by_country: Vec<BucketCount>,
    pub by_device: Vec<BucketCount>,
}

/// Drops buckets with `count < k` and orders the rest by count descending,
/// then by bucket name.
pub fn suppress(mut buckets: Vec<BucketCount>, k: i64) -> Vec<BucketCount> {
    buckets.retain(|b| b.count >= k);
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.bucket.cmp(&b.bucket)));
    buckets
}

/// Service answering per-link stats queries.
pub struct StatsService {
    links: Arc<dyn LinkRepository>,
    aggregates: Arc<dyn ClickAggregateRepository>,
    k: i64,
}

impl StatsService {
    /// Creates a stats service; `k` below 1 is raised to 1.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        aggregates: Arc<dyn ClickAggregateRepository>,
        k: i64,
    ) -> Self {
        Self {
            links,
            aggregates,
            k: k.max(1),
        }
    }

    pub fn k(&self) -> i64 {
        self.k
    }

    /// Stats of a live link over `range`, ending at the current hour.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or is deleted.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn link_stats(
        &self,
        link_id: i64,
        range: StatsRange,
    ) -> Result<LinkStatsReport, AppError> {
        if self.links.find_by_id(link_id).await?.is_none() {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "id": link_id }),
            ));
        }

        self.report_at(link_id, range, Utc::now()).await
    }

    /// Builds the report for a window ending at the hour containing `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn report_at(
        &self,
        link_id: i64,
        range: StatsRange,
        now: DateTime<Utc>,
    ) -> Result<LinkStatsReport, AppError> {
        let (from, to) = range.window(now);

        let series = self.aggregates.hourly_series(link_id, from, to).await?;

        let by_referrer = self
            .aggregates
            .breakdown(link_id, Dimension::Referrer, from, to)
            .await?;

        let by_country = self
            .aggregates
            .breakdown(link_id, Dimension::Country, from, to)
            .await?
            .into_iter()
            .map(|b| BucketCount {
                bucket: if b.bucket.is_empty() {
                    UNKNOWN_COUNTRY.to_string()
                } else {
                    b.bucket
                },
                count: b.count,
            })
            .collect();

        let by_device = self
            .aggregates
            .breakdown(link_id, Dimension::Device, from, to)
            .await?;

        Ok(LinkStatsReport {
            link_id,
            range,
            from,
            to,
            k: self.k,
            series,
            by_referrer: suppress(by_referrer, self.k),
            by_country: suppress(by_country, self.k),
            by_device: suppress(by_device, self.k),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockClickAggregateRepository, MockLinkRepository};
    use chrono::TimeZone;

    fn bucket(name: &str, count: i64) -> BucketCount {
        BucketCount {
            bucket: name.to_string(),
            count,
        }
    }

    #[test]
    fn test_range_parse() {
        assert_eq!(StatsRange::parse(Some("1d")), StatsRange::Day);
        assert_eq!(StatsRange::parse(Some("30d")), StatsRange::Month);
        assert_eq!(StatsRange::parse(Some("7d")), StatsRange::Week);
        assert_eq!(StatsRange::parse(Some("90d")), StatsRange::Week);
        assert_eq!(StatsRange::parse(None), StatsRange::Week);
    }

    #[test]
    fn test_window_ends_at_current_hour() {
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 13, 45, 12).unwrap();
        let (from, to) = StatsRange::Day.window(now);
        assert_eq!(to, Utc.with_ymd_and_hms(2025, 5, 10, 13, 0, 0).unwrap());
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 5, 9, 13, 0, 0).unwrap());
    }

    #[test]
    fn test_suppress_drops_below_k_and_sorts() {
        let out = suppress(
            vec![
                bucket("b.com", 5),
                bucket("a.com", 5),
                bucket("rare.com", 4),
                bucket("big.com", 9),
            ],
            5,
        );
        assert_eq!(
            out,
            vec![bucket("big.com", 9), bucket("a.com", 5), bucket("b.com", 5)]
        );
    }

    #[test]
    fn test_k_is_at_least_one() {
        let service = StatsService::new(
            Arc::new(MockLinkRepository::new()),
            Arc::new(MockClickAggregateRepository::new()),
            0,
        );
        assert_eq!(service.k(), 1);
    }

    #[tokio::test]
    async fn test_report_suppresses_breakdowns_not_series() {
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 13, 45, 0).unwrap();
        let hour = Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap();

        let mut aggregates = MockClickAggregateRepository::new();
        aggregates
            .expect_hourly_series()
            .returning(move |_, _, _| Ok(vec![HourlyCount { ts_hour: hour, count: 9 }]));
        aggregates
            .expect_breakdown()
            .returning(|_, dimension, _, _| {
                Ok(match dimension {
                    Dimension::Referrer => vec![bucket("direct", 5), bucket("t.co", 4)],
                    Dimension::Country => vec![bucket("", 6), bucket("DE", 3)],
                    Dimension::Device => vec![bucket("mobile", 9)],
                })
            });

        let service = StatsService::new(
            Arc::new(MockLinkRepository::new()),
            Arc::new(aggregates),
            5,
        );
        let report = service.report_at(1, StatsRange::Week, now).await.unwrap();

        assert_eq!(report.series, vec![HourlyCount { ts_hour: hour, count: 9 }]);
        assert_eq!(report.by_referrer, vec![bucket("direct", 5)]);
        assert_eq!(report.by_country, vec![bucket("unknown", 6)]);
        assert_eq!(report.by_device, vec![bucket("mobile", 9)]);
        assert!(
            report
                .by_referrer
                .iter()
                .chain(&report.by_country)
                .chain(&report.by_device)
                .all(|b| b.count >= report.k)
        );
    }

    #[tokio::test]
    async fn test_missing_link_is_not_found() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_id().returning(|_| Ok(None));

        let service = StatsService::new(
            Arc::new(links),
            Arc::new(MockClickAggregateRepository::new()),
            5,
        );
        let err = service.link_stats(3, StatsRange::Week).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
