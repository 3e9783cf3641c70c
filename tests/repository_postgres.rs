//! PostgreSQL repository tests. Run with `cargo test -- --ignored` and a
//! reachable `DATABASE_URL`; each test gets a fresh migrated database.

use chrono::{DurationRound, TimeDelta, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use shortlinks::domain::entities::{ClickAggregateKey, DeviceClass, Dimension, NewLink};
use shortlinks::domain::repositories::{ClickAggregateRepository, LinkRepository};
use shortlinks::infrastructure::persistence::{PgClickAggregateRepository, PgLinkRepository};
use shortlinks::utils::slug_codec::SlugCodec;

fn new_link(max_clicks: Option<i64>) -> NewLink {
    NewLink {
        url: "https://example.com/a".to_string(),
        expires_at: None,
        max_clicks,
        domain_scope: Some(vec!["example.com".to_string()]),
    }
}

async fn signed_link(repo: &PgLinkRepository, max_clicks: Option<i64>) -> i64 {
    let codec = SlugCodec::new(b"repository-test-key");
    let pending = repo.insert_pending(new_link(max_clicks)).await.unwrap();
    let signed = codec.make_slug(pending.id as u64, &pending.url);
    repo.finalize(pending.id, &signed).await.unwrap().id
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_two_phase_create(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let codec = SlugCodec::new(b"repository-test-key");

    let pending = repo.insert_pending(new_link(None)).await.unwrap();
    let signed = codec.make_slug(pending.id as u64, &pending.url);
    let link = repo.finalize(pending.id, &signed).await.unwrap();

    assert_eq!(link.id, pending.id);
    assert_eq!(link.slug, signed.slug);
    assert_eq!(link.id_b62, signed.id_part);
    assert_eq!(link.sig, signed.sig);
    assert_eq!(link.clicks_count, 0);
    assert_eq!(link.domain_scope, Some(vec!["example.com".to_string()]));

    let found = repo.find_by_id(link.id).await.unwrap().unwrap();
    assert_eq!(found.slug, link.slug);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_pending_rows_do_not_collide(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let a = repo.insert_pending(new_link(None)).await.unwrap();
    let b = repo.insert_pending(new_link(None)).await.unwrap();

    assert_ne!(a.id, b.id);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_increment_respects_limit(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let id = signed_link(&repo, Some(2)).await;

    assert_eq!(repo.increment_if_below_limit(id).await.unwrap(), 1);
    assert_eq!(repo.increment_if_below_limit(id).await.unwrap(), 1);
    assert_eq!(repo.increment_if_below_limit(id).await.unwrap(), 0);

    let link = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(link.clicks_count, 2);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_increments_never_exceed_limit(pool: PgPool) {
    let repo = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    let id = signed_link(&repo, Some(5)).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.increment_if_below_limit(id).await.unwrap() })
        })
        .collect();

    let mut granted = 0;
    for handle in handles {
        granted += handle.await.unwrap();
    }

    assert_eq!(granted, 5);
    assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().clicks_count, 5);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_ban_and_soft_delete(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let id = signed_link(&repo, None).await;

    assert!(repo.ban(id).await.unwrap());
    assert!(repo.find_by_id(id).await.unwrap().unwrap().is_banned);

    assert!(repo.soft_delete(id).await.unwrap());
    assert!(repo.find_by_id(id).await.unwrap().is_none());
    assert!(!repo.soft_delete(id).await.unwrap());
    assert!(!repo.ban(id).await.unwrap());
    assert_eq!(repo.increment(id).await.unwrap(), 0);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_health_check(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    assert!(repo.health_check().await);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_aggregate_upsert_and_queries(pool: PgPool) {
    let pool = Arc::new(pool);
    let links = PgLinkRepository::new(pool.clone());
    let aggregates = PgClickAggregateRepository::new(pool);
    let id = signed_link(&links, None).await;

    let hour = Utc::now().duration_trunc(TimeDelta::hours(1)).unwrap();
    let mobile = ClickAggregateKey {
        link_id: id,
        ts_hour: hour,
        referrer_domain: "direct".to_string(),
        country_code: String::new(),
        device_class: DeviceClass::Mobile,
    };
    let desktop = ClickAggregateKey {
        referrer_domain: "t.co".to_string(),
        country_code: "DE".to_string(),
        device_class: DeviceClass::Desktop,
        ..mobile.clone()
    };

    for _ in 0..3 {
        aggregates.upsert_increment(&mobile).await.unwrap();
    }
    aggregates.upsert_increment(&desktop).await.unwrap();

    let rows = aggregates.find_hour(id, hour).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].key, mobile);
    assert_eq!(rows[0].count, 3);

    let from = hour - TimeDelta::days(1);
    let series = aggregates.hourly_series(id, from, hour).await.unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].count, 4);

    let mut countries = aggregates
        .breakdown(id, Dimension::Country, from, hour)
        .await
        .unwrap();
    countries.sort_by(|a, b| a.bucket.cmp(&b.bucket));
    assert_eq!(countries.len(), 2);
    assert_eq!(countries[0].bucket, "");
    assert_eq!(countries[0].count, 3);
    assert_eq!(countries[1].bucket, "DE");

    let devices = aggregates
        .breakdown(id, Dimension::Device, from, hour)
        .await
        .unwrap();
    assert_eq!(devices.iter().map(|b| b.count).sum::<i64>(), 4);
}
