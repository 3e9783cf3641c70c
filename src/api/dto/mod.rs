//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization; request bodies
//! are checked with validator before they reach a service.

pub mod health;
pub mod link;
pub mod stats;
