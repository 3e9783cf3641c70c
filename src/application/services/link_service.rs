//! Link creation, lookup and moderation.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use crate::application::services::metrics_service::MetricsService;
use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::LinkCache;
use crate::utils::slug_codec::SlugCodec;
use crate::utils::url_normalizer::{normalize_url, url_domain};

/// Longest destination URL accepted, in characters.
pub const MAX_URL_LEN: usize = 2048;

/// Destination rules applied at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    /// Lowercase schemes a destination may use.
    pub allowed_schemes: Vec<String>,
    /// Lowercase hosts a destination must match; empty allows any host.
    pub domain_whitelist: Vec<String>,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["https".to_string()],
            domain_whitelist: Vec::new(),
        }
    }
}

fn invalid(field: &str, message: &str) -> AppError {
    AppError::bad_request("Validation failed", json!({ field: [message] }))
}

/// Service for creating signed links and moderating them.
///
/// Creation is two-phase: the row is inserted to obtain its id, then the
/// signed slug (which depends on that id) is written.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn LinkCache>,
    codec: SlugCodec,
    metrics: MetricsService,
    policy: LinkPolicy,
    cache_ttl: u64,
}

impl LinkService {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn LinkCache>,
        codec: SlugCodec,
        metrics: MetricsService,
        policy: LinkPolicy,
        cache_ttl: u64,
    ) -> Self {
        Self {
            repository,
            cache,
            codec,
            metrics,
            policy,
            cache_ttl,
        }
    }

    /// Validates, normalizes and stores a new link, then signs it.
    ///
    /// Emits `link_create_total{result=created|invalid|error}`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - URL is malformed, too long or uses a disallowed scheme
    /// - Host is outside the global whitelist or the link's `domain_scope`
    /// - `expires_at` is not in the future or `max_clicks` is below 1
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let result = self.create_inner(new_link).await;

        let label = match &result {
            Ok(_) => "created",
            Err(AppError::Validation { .. }) => "invalid",
            Err(_) => "error",
        };
        self.metrics
            .counter_inc("link_create_total", &[("result", label)], 1.0)
            .await?;

        result
    }

    async fn create_inner(&self, new_link: NewLink) -> Result<Link, AppError> {
        let new_link = self.validate(new_link)?;

        let pending = self.repository.insert_pending(new_link).await?;
        let signed = self.codec.make_slug(pending.id as u64, &pending.url);
        let link = self.repository.finalize(pending.id, &signed).await?;

        self.cache.put(&link, self.cache_ttl).await;
        tracing::info!(link_id = link.id, slug = %link.slug, "Link created");

        Ok(link)
    }

    /// Applies creation rules and returns the link with its URL normalized.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] describing the first failing rule.
    pub fn validate(&self, new_link: NewLink) -> Result<NewLink, AppError> {
        if new_link.url.trim().chars().count() > MAX_URL_LEN {
            return Err(invalid("url", "URL is too long"));
        }

        let url = normalize_url(&new_link.url).map_err(|e| invalid("url", &e.to_string()))?;
        if url.chars().count() > MAX_URL_LEN {
            return Err(invalid("url", "URL is too long"));
        }

        let scheme = url.split("://").next().unwrap_or_default();
        if !self.policy.allowed_schemes.iter().any(|s| s == scheme) {
            return Err(invalid("url", "Scheme not allowed"));
        }

        let domain = url_domain(&url);
        if !self.policy.domain_whitelist.is_empty()
            && !self.policy.domain_whitelist.iter().any(|d| d == &domain)
        {
            return Err(invalid("url", "Domain not allowed by whitelist"));
        }

        let domain_scope = new_link.domain_scope.map(|scope| {
            scope
                .into_iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect::<Vec<_>>()
        });
        if let Some(scope) = &domain_scope
            && !scope.is_empty()
            && !scope.contains(&domain)
        {
            return Err(invalid("domain_scope", "Must include the target domain"));
        }

        if let Some(expires_at) = new_link.expires_at
            && expires_at <= Utc::now()
        {
            return Err(invalid("expires_at", "Must be in the future"));
        }

        if let Some(max_clicks) = new_link.max_clicks
            && max_clicks < 1
        {
            return Err(invalid("max_clicks", "Must be at least 1"));
        }

        Ok(NewLink {
            url,
            expires_at: new_link.expires_at,
            max_clicks: new_link.max_clicks,
            domain_scope: domain_scope.filter(|s| !s.is_empty()),
        })
    }

    /// Returns a live link by id. Emits `link_show_total{result}`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link has this id.
    pub async fn show(&self, id: i64) -> Result<Link, AppError> {
        let link = self.repository.find_by_id(id).await?;
        let label = if link.is_some() { "ok" } else { "not_found" };
        self.metrics
            .counter_inc("link_show_total", &[("result", label)], 1.0)
            .await?;

        link.ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))
    }

    /// Bans a link and drops its cached copy. Emits `link_ban_total{result}`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link has this id.
    pub async fn ban(&self, id: i64) -> Result<(), AppError> {
        let banned = self.repository.ban(id).await?;
        self.moderated("link_ban_total", id, banned).await
    }

    /// Soft-deletes a link and drops its cached copy.
    /// Emits `link_delete_total{result}`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link has this id.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let deleted = self.repository.soft_delete(id).await?;
        self.moderated("link_delete_total", id, deleted).await
    }

    async fn moderated(&self, metric: &str, id: i64, changed: bool) -> Result<(), AppError> {
        if changed {
            self.cache.forget(id).await;
        }
        let label = if changed { "ok" } else { "not_found" };
        self.metrics
            .counter_inc(metric, &[("result", label)], 1.0)
            .await?;

        if changed {
            tracing::info!(link_id = id, action = metric, "Link moderated");
            Ok(())
        } else {
            Err(AppError::not_found("Link not found", json!({ "id": id })))
        }
    }
}
