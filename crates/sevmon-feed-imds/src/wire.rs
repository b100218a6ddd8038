//! Wire format of the scheduled-events metadata endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sevmon_core::types::{EventStatus, EventType, ScheduledEvent};

/// Top-level response document. Every key is optional on the wire; a
/// bare `{}` means "no events".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ScheduledEventsDocument {
    pub document_incarnation: Option<i64>,
    pub events: Vec<WireEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct WireEvent {
    pub event_id: String,
    pub event_type: String,
    pub event_status: String,
    /// RFC-2822 timestamp ("Mon, 19 Sep 2016 18:29:47 GMT") or empty.
    pub not_before: String,
    pub resources: Vec<String>,
}

/// Acknowledge request body: `{"StartRequests": [{"EventId": id}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartRequestBody {
    pub start_requests: Vec<StartRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartRequest {
    pub event_id: String,
}

impl StartRequestBody {
    pub fn for_event(event_id: &str) -> Self {
        Self {
            start_requests: vec![StartRequest {
                event_id: event_id.to_owned(),
            }],
        }
    }
}

/// Translate one wire event into the core model. An unparseable or
/// empty `NotBefore` becomes unset rather than an error.
pub fn to_scheduled_event(raw: &WireEvent) -> ScheduledEvent {
    ScheduledEvent {
        event_id: raw.event_id.clone(),
        event_type: EventType::from(raw.event_type.as_str()),
        status: EventStatus::from(raw.event_status.clone()),
        not_before: parse_not_before(&raw.not_before),
        resources: raw.resources.clone(),
    }
}

fn parse_not_before(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc2822(raw) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("unparseable NotBefore {raw:?}: {e}");
            None
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "DocumentIncarnation": 4,
        "Events": [
            {
                "EventId": "602d9444-d2cd-49c7-8624-8643e7171297",
                "EventType": "Reboot",
                "ResourceType": "VirtualMachine",
                "Resources": ["vm-frontend-0"],
                "EventStatus": "Scheduled",
                "NotBefore": "Mon, 19 Sep 2016 18:29:47 GMT"
            }
        ]
    }"#;

    #[test]
    fn parses_sample_document() {
        let doc: ScheduledEventsDocument = serde_json::from_str(SAMPLE).expect("parse");
        assert_eq!(doc.document_incarnation, Some(4));
        assert_eq!(doc.events.len(), 1);

        let event = to_scheduled_event(&doc.events[0]);
        assert_eq!(event.event_id, "602d9444-d2cd-49c7-8624-8643e7171297");
        assert_eq!(event.event_type, EventType::Reboot);
        assert_eq!(event.status, EventStatus::Scheduled);
        assert_eq!(event.resources, ["vm-frontend-0"]);
        assert_eq!(
            event.not_before,
            Utc.with_ymd_and_hms(2016, 9, 19, 18, 29, 47).single()
        );
    }

    #[test]
    fn empty_document_means_no_events() {
        let doc: ScheduledEventsDocument = serde_json::from_str("{}").expect("parse");
        assert_eq!(doc.document_incarnation, None);
        assert!(doc.events.is_empty());
    }

    #[test]
    fn missing_not_before_is_unset() {
        let raw: WireEvent = serde_json::from_str(
            r#"{"EventId": "E1", "EventType": "Preempt", "EventStatus": "Started"}"#,
        )
        .expect("parse");
        let event = to_scheduled_event(&raw);
        assert_eq!(event.not_before, None);
        assert!(event.resources.is_empty());
    }

    #[test]
    fn garbage_not_before_is_unset() {
        let raw = WireEvent {
            not_before: "soon-ish".to_owned(),
            ..WireEvent::default()
        };
        assert_eq!(to_scheduled_event(&raw).not_before, None);
    }

    #[test]
    fn unrecognized_event_type_survives_translation() {
        let raw = WireEvent {
            event_id: "E5".to_owned(),
            event_type: "LiveMigration".to_owned(),
            ..WireEvent::default()
        };
        let event = to_scheduled_event(&raw);
        assert_eq!(
            event.event_type,
            EventType::Unknown("LiveMigration".to_owned())
        );
    }

    #[test]
    fn start_request_body_shape() {
        let body = StartRequestBody::for_event("E1");
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"StartRequests": [{"EventId": "E1"}]})
        );
    }
}
