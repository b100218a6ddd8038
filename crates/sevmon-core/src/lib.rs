//! sevmon-core: domain model and automation pipeline for scheduled
//! maintenance events.
//!
//! Holds the event types, the drain-hook dispatcher, the early-ack
//! coordinator, and the port traits (feed, recorder) that the transport
//! and sink crates implement.

pub mod ack;
pub mod error;
pub mod feed;
pub mod hooks;
pub mod recorder;
pub mod types;
