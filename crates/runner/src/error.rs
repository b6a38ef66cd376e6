//! Error types for process execution.

use thiserror::Error;

/// Errors raised while running an external command.
#[derive(Debug, Error)]
pub enum Error {
    /// The executable could not be started.
    #[error("failed to execute {command}: {source}")]
    Spawn {
        /// Program and arguments
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully.
    #[error("{command} failed ({status}): {stderr}")]
    Failed {
        /// Program and arguments
        command: String,
        /// Exit status as reported by the OS
        status: String,
        /// Trimmed standard error
        stderr: String,
    },

    /// The operation observed a cancelled token or an expired deadline.
    #[error("operation cancelled")]
    Cancelled,

    /// IO error while waiting on the child
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is the result of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Standard error of a failed command, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Result type for process execution.
pub type Result<T> = std::result::Result<T, Error>;
