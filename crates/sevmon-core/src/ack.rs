//! Early-acknowledgment coordinator: decides whether a cycle's batch
//! may be acknowledged and performs the per-event acknowledge calls.

use std::time::Duration;

use crate::feed::EventFeed;
use crate::types::{AckReport, ScheduledEvent};

/// Default pause between acknowledge calls (pacing courtesy to the
/// transport, not a correctness requirement).
pub const DEFAULT_ACK_DELAY: Duration = Duration::from_secs(1);

pub struct AckCoordinator {
    delay: Duration,
}

impl AckCoordinator {
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_ACK_DELAY,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    /// Acknowledge every event in the batch, gated on the aggregate
    /// drain result.
    ///
    /// The gate is all-or-nothing: if any event's drain failed, zero
    /// acknowledge calls are made for the whole batch. When attempted,
    /// individual acknowledge failures are counted but never abort the
    /// pass; the report counts success only when every event was
    /// acknowledged.
    pub async fn acknowledge_batch(
        &self,
        feed: &dyn EventFeed,
        events: &[ScheduledEvent],
        drain_ok: bool,
    ) -> AckReport {
        if !drain_ok {
            tracing::warn!("skipping early acknowledgment due to drain hook failures");
            return AckReport {
                attempted: false,
                success_count: 0,
                total: 0,
                message: "early acknowledgment skipped due to drain hook failures".to_owned(),
            };
        }

        let total = events.len();
        let mut success_count = 0;

        for (i, event) in events.iter().enumerate() {
            match feed.acknowledge(&event.event_id).await {
                Ok(()) => {
                    tracing::info!(event_id = %event.event_id, "acknowledged event");
                    success_count += 1;
                }
                Err(e) => {
                    tracing::warn!(event_id = %event.event_id, "acknowledge failed: {e}");
                }
            }
            if i + 1 < total {
                tokio::time::sleep(self.delay).await;
            }
        }

        let message = if success_count == total {
            format!("acknowledged all {total} event(s); impact window shortened")
        } else {
            format!("acknowledged only {success_count}/{total} event(s)")
        };

        AckReport {
            attempted: true,
            success_count,
            total,
            message,
        }
    }
}

impl Default for AckCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ────────────────────────────────────────────────────────
