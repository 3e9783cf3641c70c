#![allow(dead_code)]

use axum::{Router, extract::ConnectInfo};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use shortlinks::application::services::LinkPolicy;
use shortlinks::domain::click_event::ClickEvent;
use shortlinks::infrastructure::cache::MemoryLinkCache;
use shortlinks::infrastructure::geoip::NullGeoIp;
use shortlinks::infrastructure::metrics::MemoryMetricsStore;
use shortlinks::infrastructure::persistence::{
    MemoryClickAggregateRepository, MemoryLinkRepository,
};
use shortlinks::routes::app_router;
use shortlinks::state::{AppState, Backends, Settings};

pub const HMAC_KEY: &str = "test-hmac-key";
pub const BASE_URL: &str = "https://s.example.com";
pub const PEER: &str = "127.0.0.1:12345";

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> tower::Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = PEER.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// A fully wired application over in-memory backends.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub backends: Backends,
    pub links: Arc<MemoryLinkRepository>,
    pub aggregates: Arc<MemoryClickAggregateRepository>,
    pub clicks: mpsc::Receiver<ClickEvent>,
}

pub fn settings() -> Settings {
    Settings {
        hmac_key: HMAC_KEY.to_string(),
        base_url: BASE_URL.to_string(),
        behind_proxy: false,
        k_anon: 5,
        cache_ttl_seconds: 600,
        policy: LinkPolicy::default(),
    }
}

pub fn test_app() -> TestApp {
    test_app_with(settings())
}

pub fn test_app_with(settings: Settings) -> TestApp {
    let links = Arc::new(MemoryLinkRepository::new());
    let aggregates = Arc::new(MemoryClickAggregateRepository::new());

    let backends = Backends {
        links: links.clone(),
        aggregates: aggregates.clone(),
        cache: Arc::new(MemoryLinkCache::new()),
        metrics_store: Arc::new(MemoryMetricsStore::new()),
        geoip: Arc::new(NullGeoIp),
    };

    let (tx, clicks) = mpsc::channel(100);
    let state = AppState::new(&backends, &settings, tx);

    let app = Router::new()
        .fallback_service(app_router(state.clone()))
        .layer(MockConnectInfoLayer);

    TestApp {
        server: TestServer::new(app).unwrap(),
        state,
        backends,
        links,
        aggregates,
        clicks,
    }
}

impl TestApp {
    /// Creates a link through the API and returns the 201 body.
    pub async fn create_link(&self, body: Value) -> Value {
        let response = self.server.post("/api/v1/links").json(&body).await;
        assert_eq!(response.status_code(), 201, "{}", response.text());
        response.json::<Value>()
    }

    pub async fn create_url(&self, url: &str) -> Value {
        self.create_link(json!({ "url": url })).await
    }

    pub async fn metrics_text(&self) -> String {
        self.server.get("/metrics").await.text()
    }
}

/// Path part of a `short_url`.
pub fn redirect_path(created: &Value) -> String {
    format!("/r/{}", created["slug"].as_str().unwrap())
}
