//! Repository implementations.
//!
//! PostgreSQL repositories use SQLx runtime queries with bound parameters.
//! The in-memory repositories keep the same contracts and back the test suite.
//!
//! - [`PgLinkRepository`] / [`MemoryLinkRepository`] - Links and click counters
//! - [`PgClickAggregateRepository`] / [`MemoryClickAggregateRepository`] - Hourly click rollup

pub mod memory_aggregate_repository;
pub mod memory_link_repository;
pub mod pg_aggregate_repository;
pub mod pg_link_repository;

pub use memory_aggregate_repository::MemoryClickAggregateRepository;
pub use memory_link_repository::MemoryLinkRepository;
pub use pg_aggregate_repository::PgClickAggregateRepository;
pub use pg_link_repository::PgLinkRepository;
