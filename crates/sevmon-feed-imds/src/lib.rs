//! sevmon-feed-imds: metadata-feed transport for the instance metadata
//! service's scheduled-events endpoint. Translates the wire document
//! into core [`ScheduledEvent`]s and implements the [`EventFeed`] port.
//!
//! [`ScheduledEvent`]: sevmon_core::types::ScheduledEvent
//! [`EventFeed`]: sevmon_core::feed::EventFeed

pub mod client;
pub mod wire;

pub use client::ImdsClient;
pub use sevmon_core::types;
