//! Error types shared across the pipeline crates.

use thiserror::Error;

/// Failure talking to the metadata feed. Always handled at the call
/// site; a feed error never terminates the monitor loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("feed transport error: {0}")]
    Http(String),

    #[error("feed returned status {0}")]
    Status(u16),

    #[error("failed to parse feed response: {0}")]
    Parse(String),
}

/// Failure delivering a record to a sink. Logged and tolerated; sinks
/// never block the loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("sink transport error: {0}")]
    Http(String),

    #[error("sink rejected record with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Unexpected failure inside a drain action. Caught at the action
/// boundary and downgraded to a failed [`DrainOutcome`].
///
/// [`DrainOutcome`]: crate::types::DrainOutcome
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ActionFault(pub String);

impl ActionFault {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
