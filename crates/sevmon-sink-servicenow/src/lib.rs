//! sevmon-sink-servicenow: ticketing recorder sink against the
//! ServiceNow Table API. Creates an incident per cycle: a resolved
//! low-priority automation record when the automation stages ran, or a
//! medium-priority detection incident in notification-only operation.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use sevmon_core::error::RecordError;
use sevmon_core::recorder::AutomationRecorder;
use sevmon_core::types::{AutomationResult, ScheduledEvent};

fn default_auth_type() -> String {
    "basic".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceNowConfig {
    pub instance_url: String,
    pub username: String,
    pub password: String,
    /// Only "basic" is supported; OAuth2 is deliberately out of scope.
    #[serde(default = "default_auth_type")]
    pub auth_type: String,
    #[serde(default)]
    pub assignment_group: String,
    #[serde(default)]
    pub caller_id: String,
    #[serde(default)]
    pub vm_identifier: String,
}

impl ServiceNowConfig {
    /// Required fields present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.instance_url.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceNowConfigError {
    #[error("unsupported auth type: {0} (only basic is supported)")]
    UnsupportedAuthType(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug)]
pub struct ServiceNowSink {
    config: ServiceNowConfig,
    http: reqwest::Client,
}

impl ServiceNowSink {
    pub fn new(config: ServiceNowConfig) -> Result<Self, ServiceNowConfigError> {
        if config.auth_type != "basic" {
            return Err(ServiceNowConfigError::UnsupportedAuthType(
                config.auth_type.clone(),
            ));
        }
        if config.instance_url.is_empty() {
            return Err(ServiceNowConfigError::MissingField("instance_url"));
        }
        if config.username.is_empty() {
            return Err(ServiceNowConfigError::MissingField("username"));
        }
        if config.password.is_empty() {
            return Err(ServiceNowConfigError::MissingField("password"));
        }
        Ok(Self {
            config,
            http: reqwest::Client::new(),
        })
    }

    fn incident_url(&self) -> String {
        format!(
            "{}/api/now/table/incident",
            self.config.instance_url.trim_end_matches('/')
        )
    }
}

fn event_detail_lines(events: &[ScheduledEvent]) -> String {
    let mut lines = Vec::new();
    for event in events {
        lines.push(format!("Event ID: {}", event.event_id));
        lines.push(format!("Type: {}", event.event_type));
        lines.push(format!("Status: {}", event.status));
        lines.push(format!(
            "Scheduled: {}",
            event
                .not_before
                .map_or_else(|| "unset".to_owned(), |t| t.to_rfc3339())
        ));
        lines.push(format!("Resources: {}", event.resources.join(", ")));
        lines.push(String::new());
    }
    lines.join("\n")
}

fn insert_non_empty(map: &mut serde_json::Map<String, serde_json::Value>, key: &str, value: &str) {
    if !value.is_empty() {
        map.insert(key.to_owned(), serde_json::json!(value));
    }
}

/// Incident payload for a cycle where the automation stages ran:
/// informational, created resolved, low urgency/impact/priority.
pub fn automation_payload(
    config: &ServiceNowConfig,
    events: &[ScheduledEvent],
    result: &AutomationResult,
) -> serde_json::Value {
    let automation_summary: Vec<String> = result
        .drain_outcomes
        .iter()
        .map(|o| {
            format!(
                "- [{}] {} ({}): {}",
                if o.succeeded { "ok" } else { "failed" },
                o.action_label,
                o.event_id,
                o.message,
            )
        })
        .collect();

    let description = format!(
        "Scheduled maintenance events automatically handled.\n\n\
         Event Count: {count}\n\
         Automation Time: {now}\n\
         Early ACK Status: {ack}\n\n\
         Event Details:\n{details}\n\
         Automation Actions Taken:\n{actions}\n\n\
         Impact Window: {window}\n\n\
         This record was created automatically to document automated handling \
         of scheduled maintenance events. No manual intervention was required.",
        count = events.len(),
        now = Utc::now().to_rfc3339(),
        ack = if result.early_ack_success() {
            "success"
        } else {
            "failed"
        },
        details = event_detail_lines(events),
        actions = automation_summary.join("\n"),
        window = if result.early_ack_success() {
            "shortened via early acknowledgment"
        } else {
            "standard maintenance window"
        },
    );

    let mut map = serde_json::Map::new();
    map.insert(
        "short_description".to_owned(),
        serde_json::json!(format!(
            "Scheduled maintenance event(s) automated - {} event(s)",
            events.len()
        )),
    );
    map.insert("description".to_owned(), serde_json::json!(description));
    map.insert("category".to_owned(), serde_json::json!("Infrastructure"));
    map.insert("subcategory".to_owned(), serde_json::json!("Automation"));
    map.insert("urgency".to_owned(), serde_json::json!("4"));
    map.insert("impact".to_owned(), serde_json::json!("4"));
    map.insert("priority".to_owned(), serde_json::json!("4"));
    map.insert("state".to_owned(), serde_json::json!("6"));
    map.insert(
        "close_code".to_owned(),
        serde_json::json!("Solved (Permanently)"),
    );
    map.insert(
        "close_notes".to_owned(),
        serde_json::json!("Scheduled maintenance events handled automatically. No issues detected."),
    );
    insert_non_empty(&mut map, "assignment_group", &config.assignment_group);
    insert_non_empty(&mut map, "caller_id", &config.caller_id);
    insert_non_empty(&mut map, "u_azure_vm", &config.vm_identifier);
    map.insert(
        "u_event_count".to_owned(),
        serde_json::json!(events.len().to_string()),
    );
    map.insert(
        "u_automation_success".to_owned(),
        serde_json::json!(if result.early_ack_success() {
            "true"
        } else {
            "false"
        }),
    );

    serde_json::Value::Object(map)
}

/// Incident payload for notification-only operation: open incident for
/// human follow-up, medium urgency/impact/priority.
pub fn detection_payload(
    config: &ServiceNowConfig,
    events: &[ScheduledEvent],
) -> serde_json::Value {
    let description = format!(
        "Scheduled maintenance events detected requiring attention.\n\n\
         Event Count: {count}\n\
         Detection Time: {now}\n\n\
         Event Details:\n{details}\n\
         Action Required:\n\
         - Review scheduled maintenance events\n\
         - Coordinate with infrastructure teams\n\
         - Plan for service impact during the maintenance window\n\n\
         This incident was created automatically by the scheduled-events monitor.",
        count = events.len(),
        now = Utc::now().to_rfc3339(),
        details = event_detail_lines(events),
    );

    let mut map = serde_json::Map::new();
    map.insert(
        "short_description".to_owned(),
        serde_json::json!(format!(
            "Scheduled maintenance event(s) detected - {} event(s)",
            events.len()
        )),
    );
    map.insert("description".to_owned(), serde_json::json!(description));
    map.insert("category".to_owned(), serde_json::json!("Infrastructure"));
    map.insert("subcategory".to_owned(), serde_json::json!("Maintenance"));
    map.insert("urgency".to_owned(), serde_json::json!("3"));
    map.insert("impact".to_owned(), serde_json::json!("3"));
    map.insert("priority".to_owned(), serde_json::json!("3"));
    insert_non_empty(&mut map, "assignment_group", &config.assignment_group);
    insert_non_empty(&mut map, "caller_id", &config.caller_id);
    insert_non_empty(&mut map, "u_azure_vm", &config.vm_identifier);
    map.insert(
        "u_event_count".to_owned(),
        serde_json::json!(events.len().to_string()),
    );

    serde_json::Value::Object(map)
}

#[async_trait]
impl AutomationRecorder for ServiceNowSink {
    fn name(&self) -> &str {
        "servicenow"
    }

    async fn record(
        &self,
        events: &[ScheduledEvent],
        result: &AutomationResult,
    ) -> Result<(), RecordError> {
        let payload = if result.automation_ran() {
            automation_payload(&self.config, events, result)
        } else {
            detection_payload(&self.config, events)
        };

        let response = self
            .http
            .post(self.incident_url())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Accept", "application/json")
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

        // Best effort: surface the created record's identifiers.
        if let Ok(body) = response.json::<serde_json::Value>().await {
            let number = body["result"]["number"].as_str().unwrap_or("unknown");
            let sys_id = body["result"]["sys_id"].as_str().unwrap_or("unknown");
            tracing::info!(number, sys_id, "servicenow record created");
        } else {
            tracing::info!("servicenow record created (unparseable response body)");
        }

        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sevmon_core::types::{AckReport, DrainOutcome, EventStatus, EventType};

    fn config() -> ServiceNowConfig {
        ServiceNowConfig {
            instance_url: "https://example.service-now.com".to_owned(),
            username: "monitor".to_owned(),
            password: "secret".to_owned(),
            auth_type: "basic".to_owned(),
            assignment_group: String::new(),
            caller_id: "svc-monitor".to_owned(),
            vm_identifier: "vm-frontend-0".to_owned(),
        }
    }

    fn events() -> Vec<ScheduledEvent> {
        vec![ScheduledEvent {
            event_id: "E1".to_owned(),
            event_type: EventType::Redeploy,
            status: EventStatus::Scheduled,
            not_before: None,
            resources: vec!["vm-frontend-0".to_owned()],
        }]
    }

    #[test]
    fn rejects_non_basic_auth() {
        let mut cfg = config();
        cfg.auth_type = "oauth2".to_owned();
        let err = ServiceNowSink::new(cfg).expect_err("must reject");
        assert!(matches!(err, ServiceNowConfigError::UnsupportedAuthType(_)));
    }

    #[test]
    fn rejects_missing_credentials() {
        let mut cfg = config();
        cfg.password = String::new();
        let err = ServiceNowSink::new(cfg).expect_err("must reject");
        assert_eq!(err, ServiceNowConfigError::MissingField("password"));
    }

    #[test]
    fn incident_url_normalizes_trailing_slash() {
        let mut cfg = config();
        cfg.instance_url = "https://example.service-now.com/".to_owned();
        let sink = ServiceNowSink::new(cfg).expect("sink");
        assert_eq!(
            sink.incident_url(),
            "https://example.service-now.com/api/now/table/incident"
        );
    }

    #[test]
    fn automation_payload_is_resolved_and_low_priority() {
        let mut result = AutomationResult::new();
        result.absorb_drain(
            true,
            vec![DrainOutcome {
                event_id: "E1".to_owned(),
                action_label: "backup-critical-data".to_owned(),
                succeeded: true,
                message: "critical data backed up".to_owned(),
            }],
        );
        result.absorb_ack(&AckReport {
            attempted: true,
            success_count: 1,
            total: 1,
            message: "acknowledged all 1 event(s)".to_owned(),
        });

        let payload = automation_payload(&config(), &events(), &result);

        assert_eq!(payload["subcategory"], "Automation");
        assert_eq!(payload["urgency"], "4");
        assert_eq!(payload["state"], "6");
        assert_eq!(payload["u_automation_success"], "true");
        assert_eq!(payload["u_event_count"], "1");
        // Empty optional fields are omitted entirely.
        assert!(payload.get("assignment_group").is_none());
        assert_eq!(payload["caller_id"], "svc-monitor");

        let description = payload["description"].as_str().expect("string");
        assert!(description.contains("Event ID: E1"));
        assert!(description.contains("[ok] backup-critical-data"));
        assert!(description.contains("shortened via early acknowledgment"));
    }

    #[test]
    fn detection_payload_is_open_and_medium_priority() {
        let payload = detection_payload(&config(), &events());

        assert_eq!(payload["subcategory"], "Maintenance");
        assert_eq!(payload["urgency"], "3");
        assert!(payload.get("state").is_none());
        assert!(payload.get("u_automation_success").is_none());

        let description = payload["description"].as_str().expect("string");
        assert!(description.contains("Type: redeploy"));
        assert!(description.contains("Action Required"));
    }

    #[test]
    fn failed_automation_reports_standard_window() {
        let mut result = AutomationResult::new();
        result.absorb_drain(
            false,
            vec![DrainOutcome {
                event_id: "E1".to_owned(),
                action_label: "export-state".to_owned(),
                succeeded: false,
                message: "export-state failed: disk full".to_owned(),
            }],
        );
        result.absorb_ack(&AckReport {
            attempted: false,
            success_count: 0,
            total: 0,
            message: "early acknowledgment skipped due to drain hook failures".to_owned(),
        });

        let payload = automation_payload(&config(), &events(), &result);
        assert_eq!(payload["u_automation_success"], "false");
        let description = payload["description"].as_str().expect("string");
        assert!(description.contains("standard maintenance window"));
        assert!(description.contains("[failed] export-state"));
    }
}
