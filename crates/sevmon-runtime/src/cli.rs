//! CLI definition using clap derive.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sevmon", about = "Scheduled maintenance event monitor")]
pub struct Cli {
    /// Configuration file path
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Polling interval in seconds (overrides the config file)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Poll once and exit
    #[arg(long)]
    pub once: bool,

    /// Run drain hooks in dry-run mode (no side effects)
    #[arg(long)]
    pub dry_run: bool,

    /// Metadata endpoint override, e.g. http://127.0.0.1:8080/metadata/scheduledevents
    #[arg(long)]
    pub imds_url: Option<String>,
}
