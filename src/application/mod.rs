//! Application layer services implementing business logic.
//!
//! Services consume repository, cache and metrics-store traits and expose a
//! transport-neutral API to the HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, lookup, banning and deletion
//! - [`services::redirect_service::RedirectService`] - Slug resolution with quota enforcement
//! - [`services::classifier::Classifier`] - Device, referrer and country classification
//! - [`services::aggregation_service::AggregationService`] - Hourly click rollups
//! - [`services::stats_service::StatsService`] - k-anonymous link statistics
//! - [`services::metrics_service::MetricsService`] - Counters, histograms and exposition text

pub mod services;
