//! DTOs for link statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::{LinkStatsReport, StatsRange};
use crate::domain::entities::{BucketCount, HourlyCount};

/// Query parameters of the stats endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// `1d`, `7d` or `30d`; anything else means `7d`.
    pub range: Option<String>,
}

/// Hourly series plus k-anonymous breakdowns.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub range: StatsRange,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub series: Vec<HourlyCount>,
    pub by_referrer: Vec<BucketCount>,
    pub by_country: Vec<BucketCount>,
    pub by_device: Vec<BucketCount>,
    pub k_anon: i64,
}

impl From<LinkStatsReport> for StatsResponse {
    fn from(report: LinkStatsReport) -> Self {
        Self {
            range: report.range,
            from: report.from,
            to: report.to,
            series: report.series,
            by_referrer: report.by_referrer,
            by_country: report.by_country,
            by_device: report.by_device,
            k_anon: report.k,
        }
    }
}
