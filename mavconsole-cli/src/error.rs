//! CLI error type.

use std::path::PathBuf;

use mavconsole::{ConfigError, ExpressionError};
use thiserror::Error;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Settings could not be loaded or are invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mission file is not valid JSON.
    #[error("Invalid mission file {path}: {source}")]
    Mission {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A `--display` item could not be registered.
    #[error("Invalid display item: {0}")]
    DisplayItem(#[from] ExpressionError),

    /// Every line of the capture failed to parse.
    #[error("No telemetry messages found in {0}")]
    EmptyCapture(PathBuf),

    /// The replay task stopped unexpectedly.
    #[error("Replay aborted: {0}")]
    Replay(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
