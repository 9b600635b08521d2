//! Error types for TBPM extraction

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort processing of a file, a batch, or configuration loading.
///
/// Recoverable data-quality problems inside a log are not errors; they are
/// collected as [`crate::types::Diagnostic`] values on the participant.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No input files given")]
    NoInputs,

    #[error("Log file {0} contains no lines")]
    EmptyLog(PathBuf),
}

impl ExtractError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractError::Io {
            path: path.into(),
            source,
        }
    }
}
