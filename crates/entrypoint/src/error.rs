//! Error types for entrypoint discovery.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The tree root could not be read
    #[error("cannot read tree root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tree root is not a directory
    #[error("tree root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Matcher pattern failed to compile
    #[error("invalid matcher pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Entrypoint type name is not recognised
    #[error("unknown entrypoint type: {0}")]
    UnknownType(String),
}

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;
