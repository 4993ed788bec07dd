//! Error types for package operations and configuration loading.

use std::path::PathBuf;

/// Why a package operation settled without success.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// Failure text reported by the package manager itself.
    #[error("{0}")]
    Failed(String),

    #[error("operation ended without reporting a result")]
    Aborted,

    #[error("no command configured for {0}")]
    EmptyCommand(&'static str),

    #[error("i/o error: {0}")]
    Io(String),
}

impl OperationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationError::Cancelled)
    }
}

impl From<std::io::Error> for OperationError {
    fn from(e: std::io::Error) -> Self {
        OperationError::Io(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
