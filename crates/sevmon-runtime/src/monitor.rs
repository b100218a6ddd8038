//! Monitor loop: polls the event feed on an interval and, when events
//! are found, drives the drain → early-ack → record pipeline for the
//! batch. Strictly sequential; the inter-cycle sleep is a hard barrier.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use sevmon_core::ack::AckCoordinator;
use sevmon_core::feed::EventFeed;
use sevmon_core::hooks::DrainHooks;
use sevmon_core::recorder::AutomationRecorder;
use sevmon_core::types::{AutomationResult, ScheduledEvent};

pub struct Monitor {
    feed: Arc<dyn EventFeed>,
    hooks: DrainHooks,
    ack: AckCoordinator,
    recorders: Vec<Box<dyn AutomationRecorder>>,
    poll_interval: Duration,
    /// Single-shot mode: one poll (and at most one processing pass),
    /// then return.
    once: bool,
    /// False: notification-only, the drain and ack stages are skipped.
    automation: bool,
}

impl Monitor {
    pub fn new(
        feed: Arc<dyn EventFeed>,
        hooks: DrainHooks,
        ack: AckCoordinator,
        recorders: Vec<Box<dyn AutomationRecorder>>,
        poll_interval: Duration,
        once: bool,
        automation: bool,
    ) -> Self {
        Self {
            feed,
            hooks,
            ack,
            recorders,
            poll_interval,
            once,
            automation,
        }
    }

    /// Run until cancellation or, in single-shot mode, until one poll
    /// cycle completes. Cancellation is cooperative: checked at the top
    /// of each cycle and during the inter-cycle sleep; an in-flight
    /// cycle always completes first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                tracing::info!("shutdown requested, stopping monitor");
                return;
            }

            let events = match self.feed.poll().await {
                Ok(events) => events,
                Err(e) => {
                    // Treated as "no events this cycle"; the loop never dies
                    // because of the transport.
                    tracing::warn!("poll failed: {e}");
                    Vec::new()
                }
            };

            if events.is_empty() {
                tracing::info!("no scheduled events detected");
            } else {
                tracing::info!(count = events.len(), "found scheduled event(s)");
                for event in &events {
                    tracing::info!("{}", event.summary());
                }
                let result = self.process_cycle(&events).await;
                self.log_summary(&events, &result);
            }

            if self.once {
                tracing::info!("single-shot run complete");
                return;
            }

            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("shutdown requested, stopping monitor");
                        return;
                    }
                }
            }
        }
    }

    /// One processing pass over a non-empty batch. Every fallible stage
    /// converts its failures into results; nothing here can abort the
    /// loop.
    pub async fn process_cycle(&self, events: &[ScheduledEvent]) -> AutomationResult {
        let mut result = AutomationResult::new();

        if self.automation {
            for event in events {
                let (succeeded, outcomes) = self.hooks.execute_all_hooks(event);
                if succeeded {
                    tracing::info!(event_id = %event.event_id, "drain hooks completed");
                } else {
                    tracing::warn!(event_id = %event.event_id, "drain hooks failed");
                }
                result.absorb_drain(succeeded, outcomes);
            }

            let report = self
                .ack
                .acknowledge_batch(self.feed.as_ref(), events, result.overall_drain_success)
                .await;
            tracing::info!("{}", report.message);
            result.absorb_ack(&report);
        }

        if self.recorders.is_empty() {
            tracing::info!("no record sinks configured, skipping recording");
        } else {
            let mut all_ok = true;
            for recorder in &self.recorders {
                match recorder.record(events, &result).await {
                    Ok(()) => {
                        tracing::info!(sink = recorder.name(), "record created");
                    }
                    Err(e) => {
                        tracing::warn!(sink = recorder.name(), "record failed: {e}");
                        all_ok = false;
                    }
                }
            }
            result.recorder_success = all_ok;
        }

        result
    }

    fn log_summary(&self, events: &[ScheduledEvent], result: &AutomationResult) {
        let marker = |ok: bool| if ok { "ok" } else { "failed" };
        if self.automation {
            tracing::info!(
                events = events.len(),
                drain = marker(result.overall_drain_success),
                early_ack = marker(result.early_ack_success()),
                recorder = marker(result.recorder_success),
                "cycle summary"
            );
            if result.early_ack_success() {
                tracing::info!("impact window shortened via early acknowledgment");
            } else {
                tracing::warn!("automation partially completed, manual review may be required");
            }
        } else {
            tracing::info!(
                events = events.len(),
                recorder = marker(result.recorder_success),
                "cycle summary (notification-only)"
            );
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────
