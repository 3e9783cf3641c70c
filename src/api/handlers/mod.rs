//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod links;
pub mod metrics;
pub mod redirect;
pub mod stats;

pub use health::{health_handler, ping_handler};
pub use links::{ban_link_handler, create_link_handler, delete_link_handler, show_link_handler};
pub use metrics::metrics_handler;
pub use redirect::redirect_handler;
pub use stats::stats_handler;
