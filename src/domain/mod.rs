//! Domain layer containing business entities and logic.
//!
//! Entities, the click event payload and the repository contracts live here,
//! independent of storage and transport.
//!
//! # Architecture
//!
//! - [`entities`] - Links and hourly click rollups
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Payload emitted for every counted redirect
//! - [`click_worker`] - Asynchronous click aggregation worker
//!
//! # Click Processing Flow
//!
//! 1. The redirect resolver counts a visit
//! 2. A [`click_event::ClickEvent`] is offered to a bounded channel
//! 3. [`click_worker::run_click_worker`] classifies and aggregates it with retries
//! 4. The hourly rollup is upserted via [`repositories::ClickAggregateRepository`]

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
