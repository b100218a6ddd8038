//! Reqwest-backed [`EventFeed`] implementation for the instance
//! metadata service.

use std::time::Duration;

use async_trait::async_trait;

use sevmon_core::error::FeedError;
use sevmon_core::feed::EventFeed;
use sevmon_core::types::ScheduledEvent;

use crate::wire::{ScheduledEventsDocument, StartRequestBody, to_scheduled_event};

/// Link-local metadata endpoint for scheduled events.
pub const DEFAULT_ENDPOINT: &str = "http://169.254.169.254/metadata/scheduledevents";
pub const API_VERSION: &str = "2020-07-01";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// The metadata service requires this header on every request.
const METADATA_HEADER: (&str, &str) = ("Metadata", "true");

/// Poll/acknowledge client for the scheduled-events endpoint.
///
/// Endpoint, API version, and timeout are fixed at construction; there
/// is no retry here, the monitor loop owns retry policy.
pub struct ImdsClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ImdsClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Http(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn with_default_endpoint() -> Result<Self, FeedError> {
        Self::new(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self) -> String {
        format!("{}?api-version={}", self.endpoint, API_VERSION)
    }
}

#[async_trait]
impl EventFeed for ImdsClient {
    async fn poll(&self) -> Result<Vec<ScheduledEvent>, FeedError> {
        let response = self
            .http
            .get(self.url())
            .header(METADATA_HEADER.0, METADATA_HEADER.1)
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let doc: ScheduledEventsDocument = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        tracing::debug!(
            incarnation = ?doc.document_incarnation,
            events = doc.events.len(),
            "polled scheduled events"
        );

        Ok(doc.events.iter().map(to_scheduled_event).collect())
    }

    async fn acknowledge(&self, event_id: &str) -> Result<(), FeedError> {
        let response = self
            .http
            .post(self.url())
            .header(METADATA_HEADER.0, METADATA_HEADER.1)
            .json(&StartRequestBody::for_event(event_id))
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_api_version() {
        let client = ImdsClient::new("http://127.0.0.1:9/metadata/scheduledevents", DEFAULT_TIMEOUT)
            .expect("client");
        assert_eq!(
            client.url(),
            "http://127.0.0.1:9/metadata/scheduledevents?api-version=2020-07-01"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Port 9 (discard) on localhost: connection refused, fast.
        let client = ImdsClient::new(
            "http://127.0.0.1:9/metadata/scheduledevents",
            Duration::from_millis(200),
        )
        .expect("client");

        let err = client.poll().await.expect_err("must fail");
        assert!(matches!(err, FeedError::Http(_)));
    }
}
