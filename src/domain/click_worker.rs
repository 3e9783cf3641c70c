//! Background consumer of click events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::application::services::AggregationService;
use crate::domain::click_event::ClickEvent;

const RETRY_ATTEMPTS: usize = 3;

/// Drains `rx` and records every event, with at most `concurrency` writes in
/// flight.
///
/// Failed writes are retried with jittered exponential backoff, then logged
/// and dropped. Returns once the channel is closed and every in-flight write
/// has finished.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    aggregation: Arc<AggregationService>,
    concurrency: usize,
) {
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    tracing::info!(concurrency, "Click worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let aggregation = aggregation.clone();

        tokio::spawn(async move {
            let _permit = permit;
            record_with_retry(&aggregation, &event).await;
        });
    }

    // Wait for in-flight writes.
    let _ = permits.acquire_many(concurrency as u32).await;
    tracing::info!("Click worker stopped");
}

async fn record_with_retry(aggregation: &AggregationService, event: &ClickEvent) {
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(RETRY_ATTEMPTS - 1);

    let result = Retry::spawn(strategy, || async {
        aggregation.record(event).await.inspect_err(|e| {
            tracing::debug!(link_id = event.link_id, error = %e, "Click aggregation attempt failed");
        })
    })
    .await;

    if let Err(e) = result {
        tracing::error!(
            link_id = event.link_id,
            error = %e,
            attempts = RETRY_ATTEMPTS,
            "Dropping click event after retries"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::Classifier;
    use crate::domain::entities::{ClickAggregateKey, DeviceClass, truncate_to_hour};
    use crate::domain::repositories::{ClickAggregateRepository, MockClickAggregateRepository};
    use crate::error::AppError;
    use crate::infrastructure::geoip::NullGeoIp;
    use crate::infrastructure::persistence::MemoryClickAggregateRepository;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service(repo: Arc<dyn ClickAggregateRepository>) -> Arc<AggregationService> {
        Arc::new(AggregationService::new(
            repo,
            Classifier::new(Arc::new(NullGeoIp)),
        ))
    }

    #[tokio::test]
    async fn test_worker_records_all_events() {
        let repo = Arc::new(MemoryClickAggregateRepository::new());
        let (tx, rx) = mpsc::channel(16);
        let now = Utc::now();

        for ua in ["Mozilla/5.0 (iPhone)", "Mozilla/5.0 (iPhone)", "Mozilla/5.0 (Windows NT 10.0)"] {
            tx.send(ClickEvent::new(1, None, Some(ua), None).at(now))
                .await
                .unwrap();
        }
        drop(tx);

        run_click_worker(rx, service(repo.clone()), 2).await;

        let hour = truncate_to_hour(now);
        let rows = repo.find_hour(1, hour).await.unwrap();
        let count_for = |class: DeviceClass| {
            rows.iter()
                .find(|r| r.key.device_class == class)
                .map(|r| r.count)
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(count_for(DeviceClass::Mobile), Some(2));
        assert_eq!(count_for(DeviceClass::Desktop), Some(1));
    }

    #[tokio::test]
    async fn test_worker_retries_then_succeeds() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let mut repo = MockClickAggregateRepository::new();
        repo.expect_upsert_increment()
            .times(2)
            .returning(move |_: &ClickAggregateKey| {
                if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AppError::internal("Database error", json!({})))
                } else {
                    Ok(())
                }
            });

        let (tx, rx) = mpsc::channel(1);
        tx.send(ClickEvent::new(5, None, None, None)).await.unwrap();
        drop(tx);

        run_click_worker(rx, service(Arc::new(repo)), 1).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_worker_gives_up_after_attempts() {
        let mut repo = MockClickAggregateRepository::new();
        repo.expect_upsert_increment()
            .times(RETRY_ATTEMPTS)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let (tx, rx) = mpsc::channel(1);
        tx.send(ClickEvent::new(5, None, None, None)).await.unwrap();
        drop(tx);

        run_click_worker(rx, service(Arc::new(repo)), 1).await;
    }
}
