use super::config::ConfigError;
use crate::core::io::entries::EntriesError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole run.
///
/// Configuration and input errors are raised before any record is claimed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid input: {source}")]
    InvalidInput {
        #[from]
        source: EntriesError,
    },

    #[error("Failed to write results: {0}")]
    Output(#[source] io::Error),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::InvalidConfiguration(e.to_string())
    }
}

/// Errors confined to a single record.
///
/// The pool converts each of these into a failed result and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Record not found at '{path}'", path = path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read '{path}': {message}", path = path.display())]
    Unreadable { path: PathBuf, message: String },

    #[error("Failed to parse structure: {0}")]
    Parse(String),

    #[error("Archive corruption in '{container}': {reason}", container = container.display())]
    ArchiveCorruption { container: PathBuf, reason: String },

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl RecordError {
    /// Short machine-friendly label for the failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::NotFound { .. } => "not-found",
            RecordError::Unreadable { .. } => "unreadable",
            RecordError::Parse(_) => "parse",
            RecordError::ArchiveCorruption { .. } => "archive-corruption",
            RecordError::Worker(_) => "worker",
        }
    }
}
