mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use shortlinks::application::services::LinkPolicy;
use shortlinks::state::Settings;

#[tokio::test]
async fn test_create_link_response() {
    let app = common::test_app();

    let created = app
        .create_link(json!({
            "url": "HTTPS://Example.COM/a?b=2&a=1#frag",
            "max_clicks": 10,
            "expires_at": "2999-01-01T00:00:00Z"
        }))
        .await;

    let slug = created["slug"].as_str().unwrap();
    assert_eq!(created["url"], "https://example.com/a?a=1&b=2");
    assert_eq!(created["max_clicks"], 10);
    assert!(created["expires_at"].as_str().unwrap().starts_with("2999-01-01T00:00:00"));
    assert_eq!(
        created["short_url"],
        format!("{}/r/{}", common::BASE_URL, slug)
    );
    assert!(slug.len() > 11);
}

#[tokio::test]
async fn test_create_link_without_scheme_defaults_to_https() {
    let app = common::test_app();
    let created = app.create_url("example.com/page").await;
    assert_eq!(created["url"], "https://example.com/page");
}

#[tokio::test]
async fn test_create_link_validation_errors() {
    let app = common::test_app();

    let cases = [
        json!({ "url": "" }),
        json!({ "url": "https://example.com", "max_clicks": 0 }),
        json!({ "url": "https://example.com", "expires_at": "2000-01-01T00:00:00Z" }),
        json!({ "url": "http://example.com" }),
        json!({ "url": "https://example.com", "domain_scope": ["other.org"] }),
        json!({ "url": format!("https://example.com/{}", "a".repeat(2100)) }),
    ];

    for body in cases {
        let response = app.server.post("/api/v1/links").json(&body).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{body}");
        let json = response.json::<Value>();
        assert_eq!(json["error"]["code"], "validation_error");
    }

    let metrics = app.metrics_text().await;
    assert!(metrics.contains("link_create_total{result=\"invalid\"} 6"));
}

#[tokio::test]
async fn test_domain_whitelist() {
    let app = common::test_app_with(Settings {
        policy: LinkPolicy {
            allowed_schemes: vec!["https".to_string()],
            domain_whitelist: vec!["example.com".to_string()],
        },
        ..common::settings()
    });

    app.create_url("https://example.com/ok").await;

    let response = app
        .server
        .post("/api/v1/links")
        .json(&json!({ "url": "https://evil.test/" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_show_link() {
    let app = common::test_app();
    let created = app.create_url("https://example.com").await;
    let id = created["id"].as_i64().unwrap();

    let response = app.server.get(&format!("/api/v1/links/{id}")).await;
    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["id"], id);
    assert_eq!(json["slug"], created["slug"]);
    assert_eq!(json["short_url"], created["short_url"]);
    assert_eq!(json["clicks"], 0);
    assert_eq!(json["is_banned"], false);
    assert!(json["deleted_at"].is_null());
    assert!(json["max_clicks"].is_null());
}

#[tokio::test]
async fn test_show_unknown_link() {
    let app = common::test_app();

    let response = app.server.get("/api/v1/links/999").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_delete_link() {
    let app = common::test_app();
    let created = app.create_url("https://example.com").await;
    let path = format!("/api/v1/links/{}", created["id"]);

    assert_eq!(
        app.server.delete(&path).await.status_code(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(app.server.get(&path).await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.server.delete(&path).await.status_code(),
        StatusCode::NOT_FOUND
    );

    let metrics = app.metrics_text().await;
    assert!(metrics.contains("link_delete_total{result=\"ok\"} 1"));
    assert!(metrics.contains("link_delete_total{result=\"not_found\"} 1"));
}

#[tokio::test]
async fn test_ban_link() {
    let app = common::test_app();
    let created = app.create_url("https://example.com").await;
    let id = created["id"].as_i64().unwrap();

    let response = app.server.post(&format!("/api/v1/links/{id}/ban")).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let json = app
        .server
        .get(&format!("/api/v1/links/{id}"))
        .await
        .json::<Value>();
    assert_eq!(json["is_banned"], true);

    let unknown = app.server.post("/api/v1/links/999/ban").await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ping_and_security_headers() {
    let app = common::test_app();

    let response = app.server.get("/api/ping").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "pong": true }));
    assert_eq!(response.header("x-frame-options"), "DENY");
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(
        response.header("permissions-policy"),
        "geolocation=(), microphone=(), camera=()"
    );
}
