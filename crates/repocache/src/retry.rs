//! Retry logic with exponential backoff for transient errors.

use crate::error::{Error, Result};
use crate::types::RetryConfig;
use runner::CancelToken;
use std::thread;
use std::time::Duration;

/// Callback trait for retry progress notifications.
pub trait RetryCallback {
    /// Called when an operation is being retried.
    ///
    /// * `attempt` - Current attempt number (1-indexed)
    /// * `max_attempts` - Maximum number of attempts
    /// * `error` - The error that triggered the retry
    /// * `delay` - Time until next attempt
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration);
}

/// Callback that logs retries as warnings.
pub struct LogCallback;

impl RetryCallback for LogCallback {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &Error, delay: Duration) {
        log::warn!(
            "Attempt {}/{} failed: {}. Retrying in {}s...",
            attempt,
            max_attempts,
            error,
            delay.as_secs()
        );
    }
}

/// Execute an operation with retry logic.
///
/// Retries the operation if it returns a retryable error, using exponential
/// backoff between attempts. Waiting between attempts is cut short if the
/// token is cancelled.
pub fn with_retry<T, F>(
    config: &RetryConfig,
    cancel: &CancelToken,
    callback: Option<&dyn RetryCallback>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut last_error: Option<Error> = None;

    for attempt in 0..config.max_attempts.max(1) {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() || attempt + 1 >= config.max_attempts {
                    return Err(e);
                }

                let delay = config.delay_for_attempt(attempt);
                if let Some(cb) = callback {
                    cb.on_retry(attempt + 1, config.max_attempts, &e, delay);
                }

                sleep_cancellable(delay, cancel)?;
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(Error::Cancelled))
}

fn sleep_cancellable(delay: Duration, cancel: &CancelToken) -> Result<()> {
    const STEP: Duration = Duration::from_millis(50);
    let mut remaining = delay;
    while !remaining.is_zero() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let step = remaining.min(STEP);
        thread::sleep(step);
        remaining -= step;
    }
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast() -> RetryConfig {
        RetryConfig::new(3, Duration::ZERO, 2.0)
    }

    #[test]
    fn test_retries_network_errors_until_success() {
        let calls = Cell::new(0);
        let result = with_retry(&fast(), &CancelToken::new(), None, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(Error::Network {
                    message: "reset".into(),
                })
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_non_retryable_returns_immediately() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&fast(), &CancelToken::new(), None, || {
            calls.set(calls.get() + 1);
            Err(Error::Auth {
                message: "denied".into(),
            })
        });
        assert!(matches!(result, Err(Error::Auth { .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_exhausted_returns_last_error() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&fast(), &CancelToken::new(), None, || {
            calls.set(calls.get() + 1);
            Err(Error::Network {
                message: format!("attempt {}", calls.get()),
            })
        });
        assert_eq!(calls.get(), 3);
        assert!(result.unwrap_err().to_string().contains("attempt 3"));
    }

    #[test]
    fn test_cancel_stops_waiting() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let config = RetryConfig::new(3, Duration::from_secs(60), 2.0);
        let result: Result<()> = with_retry(&config, &cancel, None, || {
            Err(Error::Network {
                message: "down".into(),
            })
        });
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
