mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::Value;
use shortlinks::domain::click_event::ClickEvent;
use shortlinks::state::Settings;

async fn record(app: &common::TestApp, link_id: i64, referrer: Option<&str>, ua: &str, n: usize) {
    let aggregation = app.backends.aggregation();
    let now = Utc::now();
    for _ in 0..n {
        aggregation
            .record(&ClickEvent::new(link_id, referrer, Some(ua), None).at(now))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_stats_suppresses_small_buckets() {
    let app = common::test_app_with(Settings {
        k_anon: 3,
        ..common::settings()
    });
    let created = app.create_url("https://example.com").await;
    let id = created["id"].as_i64().unwrap();

    record(&app, id, None, "Mozilla/5.0 (iPhone)", 4).await;
    record(&app, id, Some("https://t.co/x"), "Mozilla/5.0 (Windows NT 10.0)", 2).await;

    let response = app
        .server
        .get(&format!("/api/v1/links/{id}/stats?range=1d"))
        .await;
    response.assert_status_ok();
    let json = response.json::<Value>();

    assert_eq!(json["range"], "1d");
    assert_eq!(json["k_anon"], 3);

    let series_total: i64 = json["series"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["count"].as_i64().unwrap())
        .sum();
    assert_eq!(series_total, 6);

    let referrers = json["by_referrer"].as_array().unwrap();
    assert_eq!(referrers.len(), 1);
    assert_eq!(referrers[0]["bucket"], "direct");
    assert_eq!(referrers[0]["count"], 4);

    let devices = json["by_device"].as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["bucket"], "mobile");

    let countries = json["by_country"].as_array().unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0]["bucket"], "unknown");
    assert_eq!(countries[0]["count"], 6);
}

#[tokio::test]
async fn test_stats_default_range() {
    let app = common::test_app();
    let created = app.create_url("https://example.com").await;

    for query in ["", "?range=bogus", "?range=7d"] {
        let json = app
            .server
            .get(&format!("/api/v1/links/{}/stats{query}", created["id"]))
            .await
            .json::<Value>();
        assert_eq!(json["range"], "7d");
        assert!(json["series"].as_array().unwrap().is_empty());
        assert_eq!(json["k_anon"], 5);
    }
}

#[tokio::test]
async fn test_stats_unknown_link() {
    let app = common::test_app();
    let response = app.server.get("/api/v1/links/404/stats").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
