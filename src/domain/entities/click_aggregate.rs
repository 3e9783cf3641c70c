//! Hourly click rollup keyed by link, hour and classified dimensions.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::Serialize;
use std::fmt;

/// Device class derived from the user agent.
///
/// `Other` is never produced by classification; it exists so rows written by
/// other tools still map to a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
    Tablet,
    Bot,
    Other,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Desktop => "desktop",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Bot => "bot",
            DeviceClass::Other => "other",
        }
    }

    /// Parses a stored value; unknown strings map to [`DeviceClass::Other`].
    pub fn from_db(value: &str) -> Self {
        match value {
            "mobile" => DeviceClass::Mobile,
            "desktop" => DeviceClass::Desktop,
            "tablet" => DeviceClass::Tablet,
            "bot" => DeviceClass::Bot,
            _ => DeviceClass::Other,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite identity of a rollup row.
///
/// `country_code` is empty, never absent, when the country is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClickAggregateKey {
    pub link_id: i64,
    pub ts_hour: DateTime<Utc>,
    pub referrer_domain: String,
    pub country_code: String,
    pub device_class: DeviceClass,
}

/// A rollup row with its accumulated count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickAggregate {
    pub key: ClickAggregateKey,
    pub count: i64,
}

/// Truncates an instant to the start of its hour.
pub fn truncate_to_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .duration_trunc(TimeDelta::hours(1))
        .unwrap_or(instant)
}

/// Breakdown dimension of the rollup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Referrer,
    Country,
    Device,
}

/// One hour of the total series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    pub ts_hour: DateTime<Utc>,
    pub count: i64,
}

/// Summed count for one value of a breakdown dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub bucket: String,
    pub count: i64,
}
