//! Error types for mirror and checkout operations.
//!
//! Git failures are classified from stderr so that transient network
//! problems can be retried while authentication and missing references
//! fail fast.

use std::path::PathBuf;
use thiserror::Error;

/// Categories of repository errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable)
    Network,
    /// Credentials rejected or missing
    Auth,
    /// Reference or repository does not exist
    NotFound,
    /// Local filesystem failure
    Io,
    /// Cancelled by the caller
    Cancelled,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Auth => "Authentication failed",
            Self::NotFound => "Not found",
            Self::Io => "Filesystem error",
            Self::Cancelled => "Cancelled",
            Self::Other => "Unexpected error",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check connectivity to the git remote and try again",
            Self::Auth => "Check the configured token or SSH key",
            Self::NotFound => "Verify the repository URL and reference name",
            Self::Io => "Check free space and permissions of the cache directory",
            Self::Cancelled => "No action needed",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while mirroring or checking out a repository.
#[derive(Debug, Error)]
pub enum Error {
    /// Remote unreachable, timed out, or transfer interrupted
    #[error("network error: {message}")]
    Network { message: String },

    /// Remote rejected the credentials
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Reference could not be resolved in the mirror
    #[error("reference not found: {reference}")]
    ReferenceNotFound { reference: String },

    /// Remote repository does not exist
    #[error("repository not found: {url}")]
    RepositoryNotFound { url: String },

    /// Git command failed for another reason
    #[error("git command failed: {command}: {stderr}")]
    Git { command: String, stderr: String },

    /// The git executable could not be started
    #[error("git is not available: {0}")]
    GitUnavailable(String),

    /// Failed to create or populate a worktree directory
    #[error("failed to create worktree at {path}: {message}")]
    Worktree { path: PathBuf, message: String },

    /// Failed to remove a worktree directory
    #[error("failed to remove worktree at {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to acquire the on-disk mirror lock
    #[error("failed to lock mirror at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::Auth { .. } => ErrorCategory::Auth,
            Error::ReferenceNotFound { .. } | Error::RepositoryNotFound { .. } => {
                ErrorCategory::NotFound
            }
            Error::Worktree { .. } | Error::Cleanup { .. } | Error::Lock { .. } | Error::Io(_) => {
                ErrorCategory::Io
            }
            Error::Cancelled => ErrorCategory::Cancelled,
            Error::Git { .. } | Error::GitUnavailable(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Create an error from git command output.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_git_output(command: &str, stderr: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();

        // Authentication is checked first: ssh reports "could not read from
        // remote repository" for both auth and network failures.
        if stderr_lower.contains("authentication failed")
            || stderr_lower.contains("permission denied")
            || stderr_lower.contains("could not read username")
            || stderr_lower.contains("could not read password")
            || stderr_lower.contains("terminal prompts disabled")
            || stderr_lower.contains("invalid username or password")
            || stderr_lower.contains("error: 401")
            || stderr_lower.contains("error: 403")
        {
            return Error::Auth {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("repository not found")
            || (stderr_lower.contains("does not appear to be a git repository")
                && !stderr_lower.contains("could not read from remote"))
        {
            return Error::RepositoryNotFound {
                url: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("could not resolve host")
            || stderr_lower.contains("connection refused")
            || stderr_lower.contains("connection reset")
            || stderr_lower.contains("timed out")
            || stderr_lower.contains("network is unreachable")
            || stderr_lower.contains("unable to access")
            || stderr_lower.contains("the remote end hung up")
            || stderr_lower.contains("early eof")
            || stderr_lower.contains("rpc failed")
            || stderr_lower.contains("ssl")
            || stderr_lower.contains("could not read from remote repository")
        {
            return Error::Network {
                message: stderr.trim().to_string(),
            };
        }

        Error::Git {
            command: command.to_string(),
            stderr: stderr.trim().to_string(),
        }
    }
}

impl From<runner::Error> for Error {
    fn from(err: runner::Error) -> Self {
        match err {
            runner::Error::Cancelled => Error::Cancelled,
            runner::Error::Failed {
                command, stderr, ..
            } => Error::from_git_output(&command, &stderr),
            runner::Error::Spawn { command, source } => {
                Error::GitUnavailable(format!("{command}: {source}"))
            }
            runner::Error::Io(e) => Error::Io(e),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
    }

    #[test]
    fn test_from_git_output_network() {
        let err = Error::from_git_output(
            "git fetch",
            "fatal: unable to access 'https://example.com/x.git/': Could not resolve host: example.com",
        );
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_git_output_auth() {
        let err = Error::from_git_output(
            "git clone",
            "fatal: Authentication failed for 'https://example.com/x.git/'",
        );
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_git_output_ssh_publickey_is_auth() {
        let err = Error::from_git_output(
            "git clone",
            "git@example.com: Permission denied (publickey).\nfatal: Could not read from remote repository.",
        );
        assert_eq!(err.category(), ErrorCategory::Auth);
    }

    #[test]
    fn test_from_git_output_repository_not_found() {
        let err = Error::from_git_output("git clone", "remote: Repository not found.");
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_from_git_output_other() {
        let err = Error::from_git_output("git checkout", "error: something odd");
        assert_eq!(err.category(), ErrorCategory::Other);
        assert!(err.to_string().contains("git checkout"));
    }

    #[test]
    fn test_runner_cancel_maps_to_cancelled() {
        let err: Error = runner::Error::Cancelled.into();
        assert_eq!(err.category(), ErrorCategory::Cancelled);
    }
}
