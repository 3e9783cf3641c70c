//! Repository trait definitions for the domain layer.
//!
//! Implementations live in `crate::infrastructure::persistence`; mock
//! implementations are generated via `mockall` for unit tests.
//!
//! - [`LinkRepository`] - Links, atomic click counters and moderation flags
//! - [`ClickAggregateRepository`] - Hourly click rollup

pub mod click_aggregate_repository;
pub mod link_repository;

pub use click_aggregate_repository::ClickAggregateRepository;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_aggregate_repository::MockClickAggregateRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
