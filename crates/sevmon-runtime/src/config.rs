//! JSON configuration file: poll interval, automation block, and
//! per-sink sections. Loaded once at startup, immutable afterwards.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use sevmon_sink_servicenow::ServiceNowConfig;
use sevmon_sink_webhook::WebhookConfig;

fn default_poll_interval() -> u64 {
    30
}

fn default_ack_delay() -> u64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Present: run the drain + early-ack stages. Absent: notification-only.
    #[serde(default)]
    pub automation: Option<AutomationConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
    #[serde(default)]
    pub servicenow: Option<ServiceNowConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutomationConfig {
    #[serde(default)]
    pub dry_run: bool,
    /// Pause between acknowledge calls within one batch.
    #[serde(default = "default_ack_delay")]
    pub ack_delay_seconds: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            ack_delay_seconds: default_ack_delay(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("poll_interval_seconds must be greater than zero")]
    ZeroPollInterval,

    #[error("webhook url must not be empty")]
    EmptyWebhookUrl,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Startup-fatal checks. An incomplete optional servicenow block is
    /// not fatal; it is dropped with a warning when building sinks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_seconds == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if let Some(webhook) = &self.webhook {
            if webhook.url.is_empty() {
                return Err(ConfigError::EmptyWebhookUrl);
            }
        }
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────
