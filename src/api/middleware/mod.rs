//! HTTP middleware for request processing.
//!
//! Provides response hardening and observability middleware.

pub mod security_headers;
pub mod tracing;
