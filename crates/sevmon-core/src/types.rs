use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Event type & status ──────────────────────────────────────────

/// Kind of maintenance action the platform has scheduled.
///
/// Unrecognized type strings fail closed into [`EventType::Unknown`] so
/// that new platform event types route to the generic drain handler
/// instead of breaking the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Reboot,
    Redeploy,
    Freeze,
    Preempt,
    Terminate,
    Unknown(String),
}

impl EventType {
    pub const KNOWN: [Self; 5] = [
        Self::Reboot,
        Self::Redeploy,
        Self::Freeze,
        Self::Preempt,
        Self::Terminate,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Reboot => "reboot",
            Self::Redeploy => "redeploy",
            Self::Freeze => "freeze",
            Self::Preempt => "preempt",
            Self::Terminate => "terminate",
            Self::Unknown(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "reboot" => Self::Reboot,
            "redeploy" => Self::Redeploy,
            "freeze" => Self::Freeze,
            "preempt" => Self::Preempt,
            "terminate" => Self::Terminate,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<&str> for EventType {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        t.as_str().to_owned()
    }
}

/// Lifecycle status reported by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventStatus {
    Scheduled,
    Started,
    Unknown(String),
}

impl EventStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Started => "started",
            Self::Unknown(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "scheduled" => Self::Scheduled,
            "started" => Self::Started,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<EventStatus> for String {
    fn from(s: EventStatus) -> Self {
        s.as_str().to_owned()
    }
}

// ─── Scheduled event ──────────────────────────────────────────────

/// A pending maintenance event as reported by the metadata feed.
/// Immutable once received; identity is `event_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub event_id: String,
    pub event_type: EventType,
    pub status: EventStatus,
    /// Earliest time the platform may start the event. Unset when the
    /// feed omits it or reports it empty.
    pub not_before: Option<DateTime<Utc>>,
    /// Resources affected by the event, in feed order.
    pub resources: Vec<String>,
}

impl ScheduledEvent {
    /// One-line human-readable summary for log output.
    pub fn summary(&self) -> String {
        let not_before = self
            .not_before
            .map_or_else(|| "unset".to_owned(), |t| t.to_rfc3339());
        let resources = if self.resources.is_empty() {
            "none".to_owned()
        } else {
            self.resources.join(", ")
        };
        format!(
            "event {} [{} / {}] not-before={not_before} resources={resources}",
            self.event_id, self.event_type, self.status
        )
    }
}

// ─── Drain outcome ────────────────────────────────────────────────

/// Result of one drain action executed for one event. An event yields
/// multiple outcomes: its type-specific actions followed by the generic
/// steps. Never persisted; consumed by the same cycle's aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrainOutcome {
    pub event_id: String,
    pub action_label: String,
    pub succeeded: bool,
    pub message: String,
}

// ─── Ack report ───────────────────────────────────────────────────

/// Outcome of one early-acknowledgment pass over a cycle's batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckReport {
    /// False when acknowledgment was skipped because of drain failures.
    pub attempted: bool,
    pub success_count: usize,
    pub total: usize,
    pub message: String,
}

impl AckReport {
    /// Cycle-level success: every event in the batch acknowledged.
    /// Partial acknowledgment counts as failure.
    pub fn all_acknowledged(&self) -> bool {
        self.attempted && self.total > 0 && self.success_count == self.total
    }
}

// ─── Automation result ────────────────────────────────────────────

/// Aggregate result of one poll cycle that found events. Built across
/// the drain, acknowledgment, and recording stages, then handed to the
/// recorder sinks and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationResult {
    /// Drain outcomes in execution order (per event: type-specific
    /// actions first, generic steps last).
    pub drain_outcomes: Vec<DrainOutcome>,
    /// AND of every drain outcome's `succeeded`. Vacuously true when no
    /// drain stage ran (notification-only operation).
    pub overall_drain_success: bool,
    pub early_ack_attempted: bool,
    pub early_ack_success_count: usize,
    pub early_ack_total: usize,
    pub early_ack_message: String,
    pub recorder_success: bool,
}

impl AutomationResult {
    pub fn new() -> Self {
        Self {
            drain_outcomes: Vec::new(),
            overall_drain_success: true,
            early_ack_attempted: false,
            early_ack_success_count: 0,
            early_ack_total: 0,
            early_ack_message: String::new(),
            recorder_success: false,
        }
    }

    /// Fold one event's drain outcomes into the aggregate.
    pub fn absorb_drain(&mut self, succeeded: bool, outcomes: Vec<DrainOutcome>) {
        self.overall_drain_success = self.overall_drain_success && succeeded;
        self.drain_outcomes.extend(outcomes);
    }

    pub fn absorb_ack(&mut self, report: &AckReport) {
        self.early_ack_attempted = report.attempted;
        self.early_ack_success_count = report.success_count;
        self.early_ack_total = report.total;
        self.early_ack_message = report.message.clone();
    }

    /// True only when every event in the batch was acknowledged.
    pub fn early_ack_success(&self) -> bool {
        self.early_ack_attempted
            && self.early_ack_total > 0
            && self.early_ack_success_count == self.early_ack_total
    }

    /// Whether the automation stages (drain/ack) ran this cycle, as
    /// opposed to notification-only operation.
    pub fn automation_ran(&self) -> bool {
        !self.drain_outcomes.is_empty() || self.early_ack_attempted
    }
}

impl Default for AutomationResult {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ────────────────────────────────────────────────────────
