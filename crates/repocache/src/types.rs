//! Core types for repository caching.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// A git reference to check out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Branch or tag name, resolved against the mirror at checkout time
    Branch(String),
    /// Commit hash (full or abbreviated), used as-is
    Commit(String),
}

impl Reference {
    /// Parse a user-supplied reference.
    ///
    /// 7 to 40 hexadecimal characters are treated as a commit hash,
    /// anything else as a branch or tag name.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let is_hash = (7..=40).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit());
        if is_hash {
            Reference::Commit(s.to_lowercase())
        } else {
            Reference::Branch(s.to_string())
        }
    }

    /// Whether the reference may move between fetches.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Reference::Branch(_))
    }

    /// The name or hash as given by the user.
    pub fn label(&self) -> &str {
        match self {
            Reference::Branch(name) => name,
            Reference::Commit(hash) => hash,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Credentials used when talking to the remote.
///
/// Credentials are passed to git through the environment of each command
/// and never written into the mirror's configuration.
#[derive(Clone, Default)]
pub enum Credentials {
    #[default]
    None,
    /// HTTPS basic auth, e.g. a personal access token
    Token { username: String, token: String },
    /// SSH private key file
    SshKey { path: PathBuf },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Token { username, .. } => f
                .debug_struct("Token")
                .field("username", username)
                .field("token", &"<redacted>")
                .finish(),
            Credentials::SshKey { path } => f.debug_struct("SshKey").field("path", path).finish(),
        }
    }
}

/// Receives human-readable progress messages from long-running operations.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, message: &str);
}

/// Progress sink that forwards messages to the `log` facade at info level.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn on_progress(&self, message: &str) {
        log::info!("{message}");
    }
}

/// Configuration for retry behavior of network operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// A reference resolved to a commit in the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub reference: Reference,
    /// Full 40-character commit hash
    pub commit: String,
}

impl ResolvedRef {
    /// Abbreviated hash used for directory names.
    pub fn short(&self) -> &str {
        &self.commit[..self.commit.len().min(12)]
    }
}

/// An isolated checkout of a single commit.
///
/// The directory is exclusively owned by whoever holds this value.
#[derive(Debug, Clone)]
pub struct Worktree {
    pub path: PathBuf,
    pub commit: String,
    pub reference: Reference,
}

impl Worktree {
    /// Delete the worktree directory.
    pub fn remove(self) -> Result<()> {
        log::debug!("removing worktree {}", self.path.display());
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Cleanup {
                path: self.path,
                source,
            }),
        }
    }
}
