//! CLI command implementations for Isosim.

pub(crate) mod batch;
pub(crate) mod run;
pub(crate) mod view;

mod output;

use clap::ValueEnum;
use isosim::skirmish::{ConfigError, SkirmishConfig};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `batch` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BatchFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// Output format for the `view` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ViewFormat {
    /// The serialized player view.
    Json,
    /// Structured text for LLM consumption.
    Llm,
}

/// Configuration sources shared by every command.
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    /// Configuration file.
    pub(crate) config: Option<PathBuf>,
    /// Layout file, replacing the configured one.
    pub(crate) layout: Option<PathBuf>,
    /// Tick limit, replacing the configured one.
    pub(crate) max_ticks: Option<u64>,
}

impl Overrides {
    /// Load the configuration file, if any, and apply the flags on top.
    pub(crate) fn resolve(&self) -> Result<SkirmishConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => SkirmishConfig::load(path)?,
            None => SkirmishConfig::default(),
        };
        if let Some(layout) = &self.layout {
            config.layout = Some(layout.clone());
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Seed from the flag, or from the clock.
pub(crate) fn seed_or_random(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(42, |d| d.as_secs() ^ u64::from(d.subsec_nanos()))
    })
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}
