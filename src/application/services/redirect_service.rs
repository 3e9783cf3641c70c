//! Redirect resolution: slug verification, policy checks and click accounting.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::application::services::metrics_service::MetricsService;
use crate::domain::click_event::ClickEvent;
use crate::domain::entities::Link;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::LinkCache;
use crate::utils::slug_codec::{SIG_LEN, SlugCodec, decode_base62, parse_slug};

/// Terminal state of one resolution.
///
/// Only [`RedirectOutcome::Ok`] is visible to clients as such; every other
/// outcome is reported outward as the same "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectOutcome {
    BadSlug,
    NotFound,
    Banned,
    BadSig,
    Expired,
    LimitReached,
    Ok,
}

impl RedirectOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectOutcome::BadSlug => "bad_slug",
            RedirectOutcome::NotFound => "not_found",
            RedirectOutcome::Banned => "banned",
            RedirectOutcome::BadSig => "bad_sig",
            RedirectOutcome::Expired => "expired",
            RedirectOutcome::LimitReached => "limit_reached",
            RedirectOutcome::Ok => "ok",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RedirectOutcome::Ok)
    }
}

impl fmt::Display for RedirectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a resolution consumes a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitMode {
    /// A real visit: counts against the quota and emits a click event.
    Count,
    /// An existence check: no counter change, no event.
    Probe,
}

/// Raw request attributes carried into the click event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visitor {
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// Result of resolving one slug.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: RedirectOutcome,
    /// Destination, set only for [`RedirectOutcome::Ok`].
    pub location: Option<String>,
    /// True if this resolution incremented the link's counter.
    pub counted: bool,
}

impl Resolution {
    fn rejected(outcome: RedirectOutcome) -> Self {
        Self {
            outcome,
            location: None,
            counted: false,
        }
    }

    fn ok(link: &Link, counted: bool) -> Self {
        Self {
            outcome: RedirectOutcome::Ok,
            location: Some(link.url.clone()),
            counted,
        }
    }
}

/// Resolves slugs to destinations.
///
/// Quota decisions always go to the repository's atomic conditional
/// increment; the cache only serves the link lookup.
pub struct RedirectService {
    links: Arc<dyn LinkRepository>,
    cache: Arc<dyn LinkCache>,
    codec: SlugCodec,
    metrics: MetricsService,
    click_sender: mpsc::Sender<ClickEvent>,
    cache_ttl: u64,
}

impl RedirectService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        cache: Arc<dyn LinkCache>,
        codec: SlugCodec,
        metrics: MetricsService,
        click_sender: mpsc::Sender<ClickEvent>,
        cache_ttl: u64,
    ) -> Self {
        Self {
            links,
            cache,
            codec,
            metrics,
            click_sender,
            cache_ttl,
        }
    }

    /// Runs the resolution state machine for one request.
    ///
    /// Emits `redirect_requests_total{result}` for every outcome and
    /// `redirect_duration_seconds{result="ok"}` for successful ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the link store or the metrics store
    /// fails. The failed operation is not retried.
    pub async fn resolve(
        &self,
        slug: &str,
        mode: VisitMode,
        visitor: Visitor,
    ) -> Result<Resolution, AppError> {
        let started = Instant::now();

        let resolution = self.decide(slug, mode, visitor).await?;
        let result = resolution.outcome.as_str();

        self.metrics
            .counter_inc("redirect_requests_total", &[("result", result)], 1.0)
            .await?;
        if resolution.outcome.is_ok() {
            self.metrics
                .observe_seconds(
                    "redirect_duration_seconds",
                    started.elapsed().as_secs_f64(),
                    &[("result", result)],
                )
                .await?;
        }

        tracing::debug!(slug, outcome = result, counted = resolution.counted, "Slug resolved");
        Ok(resolution)
    }

    async fn decide(
        &self,
        slug: &str,
        mode: VisitMode,
        visitor: Visitor,
    ) -> Result<Resolution, AppError> {
        let (id_part, sig) = parse_slug(slug);
        if id_part.is_empty() || sig.chars().count() != SIG_LEN {
            return Ok(Resolution::rejected(RedirectOutcome::BadSlug));
        }

        let Some(id) = decode_base62(id_part)
            .ok()
            .and_then(|id| i64::try_from(id).ok())
        else {
            return Ok(Resolution::rejected(RedirectOutcome::BadSlug));
        };

        let Some(mut link) = self.load(id).await? else {
            return Ok(Resolution::rejected(RedirectOutcome::NotFound));
        };
        if link.is_banned {
            return Ok(Resolution::rejected(RedirectOutcome::Banned));
        }
        if !self.codec.verify(link.codec_id(), &link.url, sig) {
            return Ok(Resolution::rejected(RedirectOutcome::BadSig));
        }
        if link.is_expired_at(Utc::now()) {
            return Ok(Resolution::rejected(RedirectOutcome::Expired));
        }

        if mode == VisitMode::Probe {
            return Ok(Resolution::ok(&link, false));
        }

        let counted = if link.max_clicks.is_some() {
            self.links.increment_if_below_limit(id).await?
        } else {
            self.links.increment(id).await?
        };
        if counted == 0 {
            let outcome = if link.max_clicks.is_some() {
                RedirectOutcome::LimitReached
            } else {
                RedirectOutcome::NotFound
            };
            self.cache.forget(id).await;
            return Ok(Resolution::rejected(outcome));
        }

        link.clicks_count += 1;
        self.cache.put(&link, self.cache_ttl).await;

        self.emit(ClickEvent::new(
            id,
            visitor.referrer.as_deref(),
            visitor.user_agent.as_deref(),
            visitor.ip,
        ))
        .await?;

        Ok(Resolution::ok(&link, true))
    }

    /// Cache-aside lookup of a live link.
    async fn load(&self, id: i64) -> Result<Option<Link>, AppError> {
        if let Some(link) = self.cache.get(id).await {
            return Ok((!link.is_deleted()).then_some(link));
        }

        let link = self.links.find_by_id(id).await?;
        if let Some(link) = &link {
            self.cache.put(link, self.cache_ttl).await;
        }
        Ok(link.filter(|l| !l.is_deleted()))
    }

    /// Hands the event to the worker without waiting; a full or closed
    /// queue drops it.
    async fn emit(&self, event: ClickEvent) -> Result<(), AppError> {
        let reason = match self.click_sender.try_send(event) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(ev)) => {
                tracing::warn!(link_id = ev.link_id, "Click queue full, dropping event");
                "queue_full"
            }
            Err(TrySendError::Closed(ev)) => {
                tracing::warn!(link_id = ev.link_id, "Click queue closed, dropping event");
                "queue_closed"
            }
        };

        self.metrics
            .counter_inc("click_events_dropped_total", &[("reason", reason)], 1.0)
            .await?;
        Ok(())
    }
}
