//! Demo error types.

use std::path::PathBuf;

use tessera_core::TableError;
use thiserror::Error;

/// Errors a demo run can end with.
#[derive(Debug, Error)]
pub enum DemoError {
    /// The entity table rejected an operation.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration is malformed or out of range.
    #[error("invalid demo configuration: {0}")]
    Config(String),
}

/// Result alias for demo operations.
pub type DemoResult<T> = Result<T, DemoError>;
