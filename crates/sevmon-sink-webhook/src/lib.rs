//! sevmon-sink-webhook: generic webhook recorder sink. Posts a JSON
//! summary of the cycle's events (and automation outcome, when the
//! automation stages ran) to a configured HTTP endpoint.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use sevmon_core::error::RecordError;
use sevmon_core::recorder::AutomationRecorder;
use sevmon_core::types::{AutomationResult, ScheduledEvent};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
}

pub struct WebhookSink {
    url: String,
    http: reqwest::Client,
}

impl WebhookSink {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            url: config.url,
            http: reqwest::Client::new(),
        }
    }
}

/// Build the notification payload. Always carries the event summary;
/// when the automation stages ran, the drain/ack outcome is attached,
/// otherwise human-response alert fields are.
pub fn build_payload(events: &[ScheduledEvent], result: &AutomationResult) -> serde_json::Value {
    let event_summaries: Vec<serde_json::Value> = events
        .iter()
        .map(|e| {
            serde_json::json!({
                "eventId": e.event_id,
                "eventType": e.event_type.as_str(),
                "eventStatus": e.status.as_str(),
                "notBefore": e.not_before.map(|t| t.to_rfc3339()),
                "resources": e.resources,
            })
        })
        .collect();

    let mut payload = serde_json::json!({
        "scenario": if result.automation_ran() { "automated-handling" } else { "event-notification" },
        "timestamp": Utc::now().to_rfc3339(),
        "eventCount": events.len(),
        "events": event_summaries,
    });

    let map = payload.as_object_mut().expect("payload is an object");
    if result.automation_ran() {
        map.insert(
            "automation".to_owned(),
            serde_json::json!({
                "drainSuccess": result.overall_drain_success,
                "earlyAckSuccess": result.early_ack_success(),
                "drainResults": result
                    .drain_outcomes
                    .iter()
                    .map(|o| format!(
                        "[{}] {} ({}): {}",
                        if o.succeeded { "ok" } else { "failed" },
                        o.action_label,
                        o.event_id,
                        o.message,
                    ))
                    .collect::<Vec<_>>(),
            }),
        );
    } else {
        map.insert(
            "alertType".to_owned(),
            serde_json::json!("scheduled_event_detected"),
        );
        map.insert("severity".to_owned(), serde_json::json!("medium"));
        map.insert(
            "description".to_owned(),
            serde_json::json!(format!(
                "Detected {} scheduled event(s) requiring attention",
                events.len()
            )),
        );
        map.insert(
            "actionRequired".to_owned(),
            serde_json::json!("Review events and coordinate maintenance window"),
        );
    }

    payload
}

#[async_trait]
impl AutomationRecorder for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn record(
        &self,
        events: &[ScheduledEvent],
        result: &AutomationResult,
    ) -> Result<(), RecordError> {
        let payload = build_payload(events, result);

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RecordError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecordError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(url = %self.url, "webhook notification delivered");
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────
