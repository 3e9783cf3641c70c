//! Click event payload handed from the redirect path to the aggregation worker.

use chrono::{DateTime, Utc};

/// Raw attributes of one counted visit.
///
/// Nothing here is classified yet; the worker derives device class, referrer
/// domain and country before writing the hourly rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub link_id: i64,
    pub occurred_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: String,
    pub ip: Option<String>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    ///
    /// A missing user agent is stored as an empty string.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = ClickEvent::new(
    ///     42,
    ///     Some("https://news.example.org/post"),
    ///     Some("Mozilla/5.0"),
    ///     Some("203.0.113.7".to_string()),
    /// );
    /// ```
    pub fn new(
        link_id: i64,
        referrer: Option<&str>,
        user_agent: Option<&str>,
        ip: Option<String>,
    ) -> Self {
        Self {
            link_id,
            occurred_at: Utc::now(),
            referrer: referrer.map(str::to_string),
            user_agent: user_agent.unwrap_or_default().to_string(),
            ip,
        }
    }

    /// Overrides the event instant.
    pub fn at(mut self, instant: DateTime<Utc>) -> Self {
        self.occurred_at = instant;
        self
    }
}
