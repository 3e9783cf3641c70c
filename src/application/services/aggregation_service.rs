//! Hourly click aggregation.

use std::sync::Arc;

use crate::application::services::classifier::Classifier;
use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{ClickAggregateKey, truncate_to_hour};
use crate::domain::repositories::ClickAggregateRepository;
use crate::error::AppError;

/// Sole write path into the click rollup.
///
/// Each event becomes one atomic upsert on its composite key, so duplicate
/// delivery of an event double counts but never corrupts a row.
pub struct AggregationService {
    repository: Arc<dyn ClickAggregateRepository>,
    classifier: Classifier,
}

impl AggregationService {
    pub fn new(repository: Arc<dyn ClickAggregateRepository>, classifier: Classifier) -> Self {
        Self {
            repository,
            classifier,
        }
    }

    /// Builds the rollup key an event accumulates into.
    pub fn key_for(&self, event: &ClickEvent) -> ClickAggregateKey {
        let c = self.classifier.classify(
            &event.user_agent,
            event.referrer.as_deref(),
            event.ip.as_deref(),
        );

        ClickAggregateKey {
            link_id: event.link_id,
            ts_hour: truncate_to_hour(event.occurred_at),
            referrer_domain: c.referrer_domain,
            country_code: c.country_code,
            device_class: c.device_class,
        }
    }

    /// Classifies the event and adds one to its hourly row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the upsert fails.
    pub async fn record(&self, event: &ClickEvent) -> Result<(), AppError> {
        let key = self.key_for(event);
        self.repository.upsert_increment(&key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DeviceClass;
    use crate::domain::repositories::MockClickAggregateRepository;
    use crate::infrastructure::geoip::NullGeoIp;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn event() -> ClickEvent {
        ClickEvent::new(
            9,
            Some("https://www.Reddit.com/r/rust"),
            Some("Mozilla/5.0 (iPad)"),
            Some("192.168.0.10".to_string()),
        )
        .at(Utc.with_ymd_and_hms(2025, 2, 3, 14, 59, 59).unwrap())
    }

    #[tokio::test]
    async fn test_record_upserts_classified_key() {
        let mut repo = MockClickAggregateRepository::new();
        repo.expect_upsert_increment()
            .withf(|key| {
                key.link_id == 9
                    && key.ts_hour == Utc.with_ymd_and_hms(2025, 2, 3, 14, 0, 0).unwrap()
                    && key.referrer_domain == "www.reddit.com"
                    && key.country_code.is_empty()
                    && key.device_class == DeviceClass::Tablet
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = AggregationService::new(Arc::new(repo), Classifier::new(Arc::new(NullGeoIp)));
        service.record(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn test_record_propagates_storage_error() {
        let mut repo = MockClickAggregateRepository::new();
        repo.expect_upsert_increment()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let service = AggregationService::new(Arc::new(repo), Classifier::new(Arc::new(NullGeoIp)));
        assert!(service.record(&event()).await.is_err());
    }
}
