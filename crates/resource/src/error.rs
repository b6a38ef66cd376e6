//! Error types for rendering.

use entrypoint::EntrypointType;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning an entrypoint into resources.
#[derive(Debug, Error)]
pub enum Error {
    /// No renderer is registered for the entrypoint type
    #[error("no renderer registered for {0} entrypoints")]
    Unsupported(EntrypointType),

    /// A required external tool could not be found
    #[error("{tool} is not installed or not on PATH")]
    ToolMissing { tool: String },

    /// An external tool ran and failed
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// Tool output or a source file could not be parsed
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// Reading or writing a file failed
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }
}

impl From<runner::Error> for Error {
    fn from(err: runner::Error) -> Self {
        match err {
            runner::Error::Cancelled => Error::Cancelled,
            runner::Error::Spawn { command, source } => Error::Tool {
                tool: command,
                message: source.to_string(),
            },
            runner::Error::Failed {
                command, stderr, ..
            } => Error::Tool {
                tool: command,
                message: stderr,
            },
            runner::Error::Io(source) => Error::Tool {
                tool: "child process".to_string(),
                message: source.to_string(),
            },
        }
    }
}

/// Result type for rendering.
pub type Result<T> = std::result::Result<T, Error>;
