//! Node configuration: TOML file plus CLI overrides

use crate::cli::Cli;
use mmt_scheduler::{Priority, SchedulerConfig, SchedulerError};
use mmt_types::LanguageDirection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config {path:?}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The config file is not valid TOML for `NodeConfig`
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid scheduler section
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Any other invalid value
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Node configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Scheduler section
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Decoder section
    #[serde(default)]
    pub decoder: DecoderConfig,
    /// Translation section
    #[serde(default)]
    pub translation: TranslationConfig,
}

/// Decoder worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Worker threads, one decoder instance each
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Simulated decoding cost per batch, in milliseconds
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_threads() -> usize {
    4
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            delay_ms: 0,
        }
    }
}

/// Request configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Request timeout in milliseconds, 0 for none
    #[serde(default)]
    pub timeout_ms: u64,
    /// Source language
    #[serde(default = "default_source")]
    pub source: String,
    /// Target language
    #[serde(default = "default_target")]
    pub target: String,
    /// Priority of submitted requests
    #[serde(default)]
    pub priority: Priority,
}

fn default_source() -> String {
    "en".to_string()
}

fn default_target() -> String {
    "it".to_string()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 0,
            source: default_source(),
            target: default_target(),
            priority: Priority::default(),
        }
    }
}

impl TranslationConfig {
    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Configured language direction
    pub fn direction(&self) -> LanguageDirection {
        LanguageDirection::new(&self.source, &self.target)
    }
}

impl NodeConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Build the effective config: file (if any), then CLI overrides
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(cli);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite values given on the command line
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(policy) = cli.policy {
            self.scheduler.policy = policy;
        }
        if let Some(queue_size) = cli.queue_size {
            self.scheduler.queue_size = queue_size;
        }
        if let Some(threads) = cli.threads {
            self.decoder.threads = threads;
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            self.translation.timeout_ms = timeout_ms;
        }
        if let Some(direction) = &cli.direction {
            self.translation.source = direction.source.clone();
            self.translation.target = direction.target.clone();
        }
        if let Some(priority) = cli.priority {
            self.translation.priority = priority;
        }
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;

        if self.decoder.threads == 0 {
            return Err(ConfigError::Invalid("decoder.threads must be > 0".into()));
        }
        if self.translation.source.trim().is_empty() || self.translation.target.trim().is_empty() {
            return Err(ConfigError::Invalid("translation source and target are required".into()));
        }
        Ok(())
    }
}
