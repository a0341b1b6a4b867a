use lemon::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Lemon(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit status: 2 for a bad working directory or run options,
    /// 3 for a bad entries file, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Lemon(EngineError::InvalidConfiguration(_)) => 2,
            CliError::Lemon(EngineError::InvalidInput { .. }) => 3,
            _ => 1,
        }
    }
}
