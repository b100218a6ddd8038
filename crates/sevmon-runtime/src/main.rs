//! sevmon: scheduled maintenance event monitor binary.
//! Polls the instance metadata feed, runs drain automation and early
//! acknowledgment, and records outcomes in the configured sinks.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;

use sevmon_core::ack::AckCoordinator;
use sevmon_core::feed::EventFeed;
use sevmon_core::hooks::DrainHooks;
use sevmon_core::recorder::AutomationRecorder;
use sevmon_feed_imds::ImdsClient;
use sevmon_feed_imds::client::DEFAULT_TIMEOUT;
use sevmon_sink_servicenow::ServiceNowSink;
use sevmon_sink_webhook::WebhookSink;

mod cli;
mod config;
mod monitor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("SEVMON_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    tracing::info!("sevmon starting");

    let mut config = config::Config::load(&args.config)?;
    if let Some(interval) = args.poll_interval {
        config.poll_interval_seconds = interval;
    }
    if args.dry_run {
        config
            .automation
            .get_or_insert_with(Default::default)
            .dry_run = true;
        tracing::info!("dry-run mode: drain hooks will not perform side effects");
    }
    config.validate()?;

    let feed: Arc<dyn EventFeed> = {
        let client = match &args.imds_url {
            Some(url) => ImdsClient::new(url.clone(), DEFAULT_TIMEOUT),
            None => ImdsClient::with_default_endpoint(),
        }
        .map_err(|e| anyhow::anyhow!("failed to build metadata client: {e}"))?;
        tracing::info!(endpoint = client.endpoint(), "metadata feed configured");
        Arc::new(client)
    };

    let recorders = build_recorders(&config);
    if recorders.is_empty() {
        tracing::info!("no record sinks configured");
    }

    let automation_enabled = config.automation.is_some();
    let automation = config.automation.clone().unwrap_or_default();
    let hooks = DrainHooks::with_defaults(automation.dry_run);
    if automation_enabled {
        tracing::info!(hooks = %hooks.summary(), "automated handling enabled");
    } else {
        tracing::info!("no automation block configured, running notification-only");
    }

    let monitor = monitor::Monitor::new(
        feed,
        hooks,
        AckCoordinator::with_delay(Duration::from_secs(automation.ack_delay_seconds)),
        recorders,
        Duration::from_secs(config.poll_interval_seconds),
        args.once,
        automation_enabled,
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    tracing::info!(
        poll_interval_seconds = config.poll_interval_seconds,
        once = args.once,
        "monitoring for scheduled events"
    );
    monitor.run(stop_rx).await;
    tracing::info!("sevmon stopped");
    Ok(())
}

fn build_recorders(config: &config::Config) -> Vec<Box<dyn AutomationRecorder>> {
    let mut recorders: Vec<Box<dyn AutomationRecorder>> = Vec::new();

    if let Some(webhook) = config.webhook.clone() {
        tracing::info!(url = %webhook.url, "webhook sink configured");
        recorders.push(Box::new(WebhookSink::new(webhook)));
    }

    if let Some(snow) = config.servicenow.clone() {
        if !snow.is_complete() {
            tracing::warn!("servicenow configuration incomplete, records will be skipped");
        } else {
            match ServiceNowSink::new(snow) {
                Ok(sink) => {
                    tracing::info!("servicenow sink configured");
                    recorders.push(Box::new(sink));
                }
                Err(e) => tracing::warn!("servicenow sink disabled: {e}"),
            }
        }
    }

    recorders
}

/// Resolve on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}
