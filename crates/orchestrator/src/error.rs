//! Error types for diff orchestration.

use std::fmt;
use thiserror::Error;

/// Which of the two trees an operation ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Pre,
    Post,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Pre => "pre",
            Side::Post => "post",
        })
    }
}

/// One failure during a diff operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Checking out one side failed; fatal for the operation
    #[error("checkout of {side} reference {reference} failed: {source}")]
    Checkout {
        side: Side,
        reference: String,
        #[source]
        source: repocache::Error,
    },

    /// Discovering entrypoints in one tree failed; fatal for the operation
    #[error("entrypoint discovery in {side} tree failed: {source}")]
    Discover {
        side: Side,
        #[source]
        source: entrypoint::Error,
    },

    /// No renderer could be obtained for an entrypoint
    #[error("entrypoint {entrypoint}: {source}")]
    Renderer {
        entrypoint: String,
        #[source]
        source: resource::Error,
    },

    /// Rendering one side of an entrypoint failed
    #[error("entrypoint {entrypoint}: rendering {side} failed: {source}")]
    Render {
        entrypoint: String,
        side: Side,
        #[source]
        source: resource::Error,
    },

    /// The worker pool could not be created
    #[error("failed to create worker pool: {0}")]
    Pool(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the failure is (or wraps) a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Checkout { source, .. } => matches!(source, repocache::Error::Cancelled),
            Error::Render { source, .. } | Error::Renderer { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Whether the failure stops the whole operation rather than one entrypoint.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Checkout { .. } | Error::Discover { .. } | Error::Pool(_)
        )
    }
}

/// Every error of an operation, none dropped.
#[derive(Debug, Default)]
pub struct JoinedError {
    errors: Vec<Error>,
}

impl JoinedError {
    pub fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        self.errors.iter().any(Error::is_cancelled)
    }
}

impl From<Error> for JoinedError {
    fn from(error: Error) -> Self {
        Self::new(vec![error])
    }
}

impl fmt::Display for JoinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("no errors"),
            [single] => write!(f, "{single}"),
            many => {
                write!(f, "{} errors:", many.len())?;
                for error in many {
                    write!(f, "\n  - {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for JoinedError {}

/// Result type for orchestration.
pub type Result<T> = std::result::Result<T, JoinedError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn render_error(entrypoint: &str) -> Error {
        Error::Render {
            entrypoint: entrypoint.to_string(),
            side: Side::Post,
            source: resource::Error::ToolMissing {
                tool: "terraform".to_string(),
            },
        }
    }

    #[test]
    fn test_joined_error_lists_every_error() {
        let joined = JoinedError::new(vec![render_error("infra"), render_error("net"), Error::Cancelled]);
        let text = joined.to_string();
        assert!(text.starts_with("3 errors:"));
        assert!(text.contains("entrypoint infra: rendering post failed"));
        assert!(text.contains("entrypoint net"));
        assert!(text.contains("operation cancelled"));
        assert!(joined.is_cancelled());
    }

    #[test]
    fn test_single_error_display() {
        let joined = JoinedError::from(render_error("infra"));
        assert_eq!(
            joined.to_string(),
            "entrypoint infra: rendering post failed: terraform is not installed or not on PATH"
        );
        assert!(!joined.is_cancelled());
    }

    #[test]
    fn test_fatality() {
        assert!(!render_error("x").is_fatal());
        assert!(Error::Pool("no threads".into()).is_fatal());
        let cancelled_render = Error::Render {
            entrypoint: "x".into(),
            side: Side::Pre,
            source: resource::Error::Cancelled,
        };
        assert!(cancelled_render.is_cancelled());
    }
}
