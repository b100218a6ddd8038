//! Drain-hook dispatcher: maps an event's type to an ordered sequence
//! of preparation actions and executes them, collecting one
//! [`DrainOutcome`] per action.
//!
//! Actions are capability-typed closures injected by the host. The
//! defaults shipped here are simulated preparations standing in for
//! real integrations (load balancer drain, backup jobs, ...).

use std::collections::HashMap;

use crate::error::ActionFault;
use crate::types::{DrainOutcome, EventType, ScheduledEvent};

/// A single drain action. Returns a human-readable success message or
/// a fault, which the dispatcher downgrades to a failed outcome.
pub type DrainAction = Box<dyn Fn(&ScheduledEvent) -> Result<String, ActionFault> + Send + Sync>;

struct NamedAction {
    label: String,
    action: DrainAction,
}

/// Per-event-type drain action registry plus the fixed generic steps
/// that run for every event regardless of type.
pub struct DrainHooks {
    dry_run: bool,
    by_type: HashMap<EventType, Vec<NamedAction>>,
    /// Fallback actions for event types with no registered sequence
    /// (including unrecognized types).
    fallback: Vec<NamedAction>,
    /// Always run after the type-specific actions.
    generic_steps: Vec<NamedAction>,
}

impl DrainHooks {
    /// Empty registry. Hosts register their own actions.
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            by_type: HashMap::new(),
            fallback: Vec::new(),
            generic_steps: Vec::new(),
        }
    }

    /// Registry preloaded with the simulated default preparations.
    pub fn with_defaults(dry_run: bool) -> Self {
        let mut hooks = Self::new(dry_run);

        hooks.register(EventType::Reboot, "stop-applications", |_| {
            Ok("applications gracefully stopped".to_owned())
        });
        hooks.register(EventType::Reboot, "flush-caches", |_| {
            Ok("caches flushed".to_owned())
        });
        hooks.register(EventType::Reboot, "sync-database", |_| {
            Ok("database synchronized".to_owned())
        });

        hooks.register(EventType::Redeploy, "backup-critical-data", |_| {
            Ok("critical data backed up".to_owned())
        });
        hooks.register(EventType::Redeploy, "export-state", |_| {
            Ok("application state exported".to_owned())
        });
        hooks.register(EventType::Redeploy, "notify-monitoring", |_| {
            Ok("monitoring systems notified".to_owned())
        });

        hooks.register(EventType::Preempt, "save-work-in-progress", |_| {
            Ok("work in progress saved".to_owned())
        });
        hooks.register(EventType::Preempt, "migrate-workload", |_| {
            Ok("workload migrated to other instances".to_owned())
        });
        hooks.register(EventType::Preempt, "update-job-queues", |_| {
            Ok("job queues updated".to_owned())
        });

        hooks.register_fallback("save-state", |_| Ok("current state saved".to_owned()));
        hooks.register_fallback("graceful-shutdown", |_| {
            Ok("basic application shutdown completed".to_owned())
        });

        hooks.register_generic_step("log-event", |event| {
            Ok(format!("event {} logged", event.event_id))
        });
        hooks.register_generic_step("update-monitoring", |_| {
            Ok("monitoring systems updated".to_owned())
        });
        hooks.register_generic_step("update-health-checks", |_| {
            Ok("health checks updated".to_owned())
        });

        hooks
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Append an action to the sequence for `event_type`. Order of
    /// registration is order of execution.
    pub fn register<F>(&mut self, event_type: EventType, label: &str, action: F)
    where
        F: Fn(&ScheduledEvent) -> Result<String, ActionFault> + Send + Sync + 'static,
    {
        self.by_type.entry(event_type).or_default().push(NamedAction {
            label: label.to_owned(),
            action: Box::new(action),
        });
    }

    /// Append a fallback action, run for event types with no registered
    /// sequence.
    pub fn register_fallback<F>(&mut self, label: &str, action: F)
    where
        F: Fn(&ScheduledEvent) -> Result<String, ActionFault> + Send + Sync + 'static,
    {
        self.fallback.push(NamedAction {
            label: label.to_owned(),
            action: Box::new(action),
        });
    }

    /// Append a generic step, run after the type-specific actions for
    /// every event.
    pub fn register_generic_step<F>(&mut self, label: &str, action: F)
    where
        F: Fn(&ScheduledEvent) -> Result<String, ActionFault> + Send + Sync + 'static,
    {
        self.generic_steps.push(NamedAction {
            label: label.to_owned(),
            action: Box::new(action),
        });
    }

    /// Run every applicable action for `event`: type-specific actions
    /// (or the fallback sequence) first, generic steps last. Returns
    /// the AND of all action results together with one outcome per
    /// action, in execution order.
    ///
    /// Faults never propagate: an action's `Err` becomes a failed
    /// outcome carrying the fault text. In dry-run mode no action body
    /// runs at all; every outcome reports success with a dry-run label.
    pub fn execute_all_hooks(&self, event: &ScheduledEvent) -> (bool, Vec<DrainOutcome>) {
        let selected = self
            .by_type
            .get(&event.event_type)
            .unwrap_or(&self.fallback);

        tracing::info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            actions = selected.len(),
            generic_steps = self.generic_steps.len(),
            dry_run = self.dry_run,
            "executing drain hooks"
        );

        let mut outcomes = Vec::with_capacity(selected.len() + self.generic_steps.len());
        let mut success = true;

        for named in selected.iter().chain(self.generic_steps.iter()) {
            let outcome = self.run_action(event, named);
            if outcome.succeeded {
                tracing::info!(action = %outcome.action_label, "{}", outcome.message);
            } else {
                tracing::warn!(action = %outcome.action_label, "{}", outcome.message);
                success = false;
            }
            outcomes.push(outcome);
        }

        (success, outcomes)
    }

    fn run_action(&self, event: &ScheduledEvent, named: &NamedAction) -> DrainOutcome {
        if self.dry_run {
            // Short-circuit before the action body; no side effect runs.
            return DrainOutcome {
                event_id: event.event_id.clone(),
                action_label: named.label.clone(),
                succeeded: true,
                message: format!("[dry-run] {} skipped", named.label),
            };
        }

        match (named.action)(event) {
            Ok(message) => DrainOutcome {
                event_id: event.event_id.clone(),
                action_label: named.label.clone(),
                succeeded: true,
                message,
            },
            Err(fault) => DrainOutcome {
                event_id: event.event_id.clone(),
                action_label: named.label.clone(),
                succeeded: false,
                message: format!("{} failed: {fault}", named.label),
            },
        }
    }

    /// Describe the registered hooks, for the automation startup log.
    pub fn summary(&self) -> serde_json::Value {
        let labels = |actions: &[NamedAction]| -> Vec<String> {
            actions.iter().map(|a| a.label.clone()).collect()
        };

        let mut by_type: Vec<(String, Vec<String>)> = self
            .by_type
            .iter()
            .map(|(t, actions)| (t.as_str().to_owned(), labels(actions)))
            .collect();
        by_type.sort_by(|a, b| a.0.cmp(&b.0));

        let mut hooks = serde_json::Map::new();
        for (event_type, action_labels) in by_type {
            hooks.insert(event_type, serde_json::json!(action_labels));
        }

        serde_json::json!({
            "hooks": hooks,
            "fallback": labels(&self.fallback),
            "generic_steps": labels(&self.generic_steps),
            "dry_run": self.dry_run,
        })
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventStatus;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(id: &str, event_type: &str) -> ScheduledEvent {
        ScheduledEvent {
            event_id: id.to_owned(),
            event_type: EventType::from(event_type),
            status: EventStatus::Scheduled,
            not_before: None,
            resources: vec!["vm0".to_owned()],
        }
    }

    #[test]
    fn type_specific_actions_then_generic_steps() {
        let hooks = DrainHooks::with_defaults(false);
        let (success, outcomes) = hooks.execute_all_hooks(&event("E1", "reboot"));

        assert!(success);
        let labels: Vec<&str> = outcomes.iter().map(|o| o.action_label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "stop-applications",
                "flush-caches",
                "sync-database",
                "log-event",
                "update-monitoring",
                "update-health-checks",
            ]
        );
        assert!(outcomes.iter().all(|o| o.succeeded));
        assert!(outcomes.iter().all(|o| o.event_id == "E1"));
    }

    #[test]
    fn unknown_type_routes_to_fallback() {
        let hooks = DrainHooks::with_defaults(false);
        let (success, outcomes) = hooks.execute_all_hooks(&event("E9", "LiveMigration"));

        assert!(success);
        let labels: Vec<&str> = outcomes.iter().map(|o| o.action_label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "save-state",
                "graceful-shutdown",
                "log-event",
                "update-monitoring",
                "update-health-checks",
            ]
        );
    }

    #[test]
    fn terminate_has_no_specific_sequence_and_uses_fallback() {
        let hooks = DrainHooks::with_defaults(false);
        let (success, outcomes) = hooks.execute_all_hooks(&event("E2", "terminate"));
        assert!(success);
        assert_eq!(outcomes[0].action_label, "save-state");
    }

    #[test]
    fn fault_is_caught_and_downgraded() {
        let mut hooks = DrainHooks::new(false);
        hooks.register(EventType::Reboot, "stop-applications", |_| {
            Err(ActionFault::new("connection refused"))
        });
        hooks.register(EventType::Reboot, "flush-caches", |_| Ok("ok".to_owned()));
        hooks.register_generic_step("log-event", |_| Ok("logged".to_owned()));

        let (success, outcomes) = hooks.execute_all_hooks(&event("E1", "reboot"));

        assert!(!success);
        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].succeeded);
        assert!(outcomes[0].message.contains("connection refused"));
        // Later actions still run after a failure.
        assert!(outcomes[1].succeeded);
        assert!(outcomes[2].succeeded);
    }

    #[test]
    fn dry_run_short_circuits_before_action_body() {
        let executed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&executed);

        let mut hooks = DrainHooks::new(true);
        hooks.register(EventType::Reboot, "stop-applications", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ActionFault::new("must never run"))
        });
        hooks.register_generic_step("log-event", |_| Ok("logged".to_owned()));

        let (success, outcomes) = hooks.execute_all_hooks(&event("E1", "reboot"));

        assert!(success);
        assert_eq!(executed.load(Ordering::SeqCst), 0);
        assert!(outcomes.iter().all(|o| o.succeeded));
        assert!(outcomes.iter().all(|o| o.message.contains("[dry-run]")));
    }

    #[test]
    fn dry_run_covers_unknown_types() {
        let hooks = DrainHooks::with_defaults(true);
        let (success, outcomes) = hooks.execute_all_hooks(&event("E7", "mystery"));
        assert!(success);
        assert!(!outcomes.is_empty());
        assert!(outcomes.iter().all(|o| o.succeeded && o.message.contains("[dry-run]")));
    }

    #[test]
    fn summary_lists_registered_hooks() {
        let hooks = DrainHooks::with_defaults(true);
        let summary = hooks.summary();
        assert_eq!(summary["dry_run"], serde_json::json!(true));
        assert_eq!(
            summary["hooks"]["reboot"][0],
            serde_json::json!("stop-applications")
        );
        assert_eq!(summary["fallback"][0], serde_json::json!("save-state"));
        assert_eq!(summary["generic_steps"][2], serde_json::json!("update-health-checks"));
    }
}
