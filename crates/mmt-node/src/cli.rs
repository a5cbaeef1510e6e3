//! CLI argument parsing for mmt-node

use clap::Parser;
use mmt_scheduler::{Priority, SchedulingPolicy};
use mmt_types::LanguageDirection;
use std::path::PathBuf;

/// MMT translation node: translates stdin, one sentence per line
#[derive(Parser, Debug, Clone)]
#[command(name = "mmt-node")]
#[command(about = "MMT translation node")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML); flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Scheduling policy (priority-classes, unified)
    #[arg(long)]
    pub policy: Option<SchedulingPolicy>,

    /// Maximum queued splits
    #[arg(long)]
    pub queue_size: Option<usize>,

    /// Decoder worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Request timeout in milliseconds (0 disables the timeout)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Language direction, e.g. "en-it"
    #[arg(long, short)]
    pub direction: Option<LanguageDirection>,

    /// Priority of the submitted requests (high, normal, background)
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Print each translation as a JSON object
    #[arg(long)]
    pub json: bool,

    /// Print a metrics snapshot to stderr on exit
    #[arg(long)]
    pub metrics: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
