//! Core domain entities.
//!
//! - [`Link`] - A signed short link with quota, expiry and moderation state
//! - [`ClickAggregate`] - One hourly rollup row of classified clicks
//!
//! Links are built in two steps: [`NewLink`] is inserted as a [`PendingLink`]
//! to obtain its id, then finalized once the signed slug is known.

pub mod click_aggregate;
pub mod link;

pub use click_aggregate::{
    BucketCount, ClickAggregate, ClickAggregateKey, DeviceClass, Dimension, HourlyCount,
    truncate_to_hour,
};
pub use link::{Link, NewLink, PendingLink};
