//! Shared application state and its assembly from storage backends.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{
    AggregationService, Classifier, LinkPolicy, LinkService, MetricsService, RedirectService,
    StatsService,
};
use crate::config::Config;
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::{ClickAggregateRepository, LinkRepository};
use crate::infrastructure::cache::LinkCache;
use crate::infrastructure::geoip::GeoIpLookup;
use crate::infrastructure::metrics::MetricsStore;
use crate::utils::slug_codec::SlugCodec;

/// Storage and lookup collaborators the services are built on.
#[derive(Clone)]
pub struct Backends {
    pub links: Arc<dyn LinkRepository>,
    pub aggregates: Arc<dyn ClickAggregateRepository>,
    pub cache: Arc<dyn LinkCache>,
    pub metrics_store: Arc<dyn MetricsStore>,
    pub geoip: Arc<dyn GeoIpLookup>,
}

impl Backends {
    /// Aggregation service consumed by the click worker.
    pub fn aggregation(&self) -> AggregationService {
        AggregationService::new(
            self.aggregates.clone(),
            Classifier::new(self.geoip.clone()),
        )
    }
}

/// Service settings independent of storage.
#[derive(Debug, Clone)]
pub struct Settings {
    pub hmac_key: String,
    pub base_url: String,
    pub behind_proxy: bool,
    pub k_anon: i64,
    pub cache_ttl_seconds: u64,
    pub policy: LinkPolicy,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            hmac_key: config.hmac_key.clone(),
            base_url: config.base_url.clone(),
            behind_proxy: config.behind_proxy,
            k_anon: config.k_anon,
            cache_ttl_seconds: config.cache_ttl_seconds,
            policy: LinkPolicy {
                allowed_schemes: config.allowed_schemes.clone(),
                domain_whitelist: config.domain_whitelist.clone(),
            },
        }
    }
}

/// State injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub redirect_service: Arc<RedirectService>,
    pub stats_service: Arc<StatsService>,
    pub metrics: MetricsService,
    pub links: Arc<dyn LinkRepository>,
    pub cache: Arc<dyn LinkCache>,
    pub click_sender: mpsc::Sender<ClickEvent>,
    pub base_url: String,
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires every service over `backends`.
    ///
    /// Counted redirects publish their click events on `click_sender`.
    pub fn new(
        backends: &Backends,
        settings: &Settings,
        click_sender: mpsc::Sender<ClickEvent>,
    ) -> Self {
        let codec = SlugCodec::new(settings.hmac_key.as_bytes());
        let metrics = MetricsService::new(backends.metrics_store.clone());

        let link_service = Arc::new(LinkService::new(
            backends.links.clone(),
            backends.cache.clone(),
            codec.clone(),
            metrics.clone(),
            settings.policy.clone(),
            settings.cache_ttl_seconds,
        ));

        let redirect_service = Arc::new(RedirectService::new(
            backends.links.clone(),
            backends.cache.clone(),
            codec,
            metrics.clone(),
            click_sender.clone(),
            settings.cache_ttl_seconds,
        ));

        let stats_service = Arc::new(StatsService::new(
            backends.links.clone(),
            backends.aggregates.clone(),
            settings.k_anon,
        ));

        Self {
            link_service,
            redirect_service,
            stats_service,
            metrics,
            links: backends.links.clone(),
            cache: backends.cache.clone(),
            click_sender,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            behind_proxy: settings.behind_proxy,
        }
    }

    /// Public URL of a slug.
    pub fn short_url(&self, slug: &str) -> String {
        format!("{}/r/{}", self.base_url, slug)
    }
}
