//! MMT node binary
//!
//! Reads sentences from stdin, one per line, translates them through the
//! scheduler and decoder pool, and writes the translations to stdout in input
//! order.

mod cli;
mod config;
mod node;

use anyhow::Result;
use cli::Cli;
use config::NodeConfig;
use mmt_decoder::{TranslateResult, Translator};
use mmt_types::{LanguageDirection, Translation};
use node::Node;
use std::collections::VecDeque;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type Pending = JoinHandle<TranslateResult<Translation>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize tracing; stdout carries translations
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!("MMT node starting...");

    let config = NodeConfig::from_cli(&cli)?;
    let node = Node::start(config)?;
    let translator = node.translator();
    let direction = node.config().translation.direction();
    let priority = node.config().translation.priority;
    let max_in_flight = node.config().decoder.threads * 2;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut in_flight: VecDeque<Pending> = VecDeque::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                in_flight.push_back(submit(&translator, direction.clone(), priority, line));

                if in_flight.len() >= max_in_flight {
                    if let Some(next) = in_flight.pop_front() {
                        write_result(&mut stdout, next.await?, cli.json).await?;
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    while let Some(next) = in_flight.pop_front() {
        write_result(&mut stdout, next.await?, cli.json).await?;
    }
    stdout.flush().await?;

    let metrics = node.metrics().clone();
    tokio::task::spawn_blocking(move || node.shutdown()).await?;

    if cli.metrics {
        eprintln!("{}", metrics.snapshot().to_json()?);
    }

    tracing::info!("MMT node stopped");
    Ok(())
}

/// Translate one input line on the blocking pool
fn submit(
    translator: &Translator,
    direction: LanguageDirection,
    priority: mmt_scheduler::Priority,
    line: String,
) -> Pending {
    let translator = translator.clone();
    tokio::task::spawn_blocking(move || translator.translate_text(direction, &line, priority))
}

/// Write one output line: the translation, or the error for that input line
async fn write_result(
    stdout: &mut tokio::io::Stdout,
    result: TranslateResult<Translation>,
    json: bool,
) -> Result<()> {
    let line = match (result, json) {
        (Ok(translation), true) => serde_json::to_string(&translation)?,
        (Ok(translation), false) => translation.text(),
        (Err(err), true) => serde_json::json!({ "error": err.to_string() }).to_string(),
        (Err(err), false) => {
            tracing::warn!(%err, "translation failed");
            String::new()
        }
    };

    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    Ok(())
}
