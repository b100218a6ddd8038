//! Port trait for the system-of-record sinks.

use async_trait::async_trait;

use crate::error::RecordError;
use crate::types::{AutomationResult, ScheduledEvent};

/// Durable-record collaborator: given a cycle's events and aggregated
/// automation result, produce a record in an external system (ticket,
/// webhook notification, ...).
///
/// Recorder failure or absence never blocks the monitor loop; the
/// caller logs and continues.
#[async_trait]
pub trait AutomationRecorder: Send + Sync {
    /// Short sink name for log output.
    fn name(&self) -> &str;

    async fn record(
        &self,
        events: &[ScheduledEvent],
        result: &AutomationResult,
    ) -> Result<(), RecordError>;
}
