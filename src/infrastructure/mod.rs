//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain and application
//! layers.
//!
//! # Modules
//!
//! - [`cache`] - Link cache (Redis, in-memory and no-op implementations)
//! - [`geoip`] - IP to country resolution
//! - [`metrics`] - Key-value stores behind the metrics accumulator
//! - [`persistence`] - PostgreSQL and in-memory repositories

pub mod cache;
pub mod geoip;
pub mod metrics;
pub mod persistence;
