//! Port trait for the maintenance-event metadata feed.

use async_trait::async_trait;

use crate::error::FeedError;
use crate::types::ScheduledEvent;

/// Poll/acknowledge interface over the metadata transport. The only
/// abstraction through which the pipeline touches the feed.
///
/// Implementations do not retry; the caller owns retry policy.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Fetch the currently pending events. An empty list is a normal
    /// result, not an error.
    async fn poll(&self) -> Result<Vec<ScheduledEvent>, FeedError>;

    /// Signal the platform that the host is ready for the given event
    /// to start (early acknowledgment).
    async fn acknowledge(&self, event_id: &str) -> Result<(), FeedError>;
}
