//! Business logic services for the application layer.

pub mod aggregation_service;
pub mod classifier;
pub mod link_service;
pub mod metrics_service;
pub mod redirect_service;
pub mod stats_service;

pub use aggregation_service::AggregationService;
pub use classifier::{Classification, Classifier};
pub use link_service::{LinkPolicy, LinkService};
pub use metrics_service::MetricsService;
pub use redirect_service::{RedirectOutcome, RedirectService, Resolution, VisitMode, Visitor};
pub use stats_service::{LinkStatsReport, StatsRange, StatsService};
