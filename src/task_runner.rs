//! Retry runner for calls that cross a network boundary.
//!
//! Each attempt is bounded by a timeout; transient failures are retried with
//! exponential backoff until the attempt budget is spent.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::domain::errors::FetchError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_retry_delay: Duration,
    /// Maximum delay between retries
    pub max_retry_delay: Duration,
    /// Upper bound on a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            initial_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(4),
            attempt_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug)]
struct BackoffState {
    attempts: u32,
    current_retry_delay: Duration,
}

impl BackoffState {
    fn new(initial_delay: Duration) -> Self {
        Self {
            attempts: 0,
            current_retry_delay: initial_delay,
        }
    }

    /// Returns the delay to wait now and doubles the next one, capped.
    fn next_delay(&mut self, max_delay: Duration) -> Duration {
        let delay = self.current_retry_delay;
        self.current_retry_delay = std::cmp::min(self.current_retry_delay * 2, max_delay);
        delay
    }
}

/// Run `task_fn` until it succeeds, fails permanently, or the attempt budget
/// is exhausted. The last error is returned in the latter two cases.
pub async fn run_with_retry<T, F, Fut>(
    task_name: &str,
    config: &RetryConfig,
    mut task_fn: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut state = BackoffState::new(config.initial_retry_delay);
    let max_attempts = config.max_attempts.max(1);

    loop {
        state.attempts += 1;
        let outcome = match timeout(config.attempt_timeout, task_fn()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                timeout_ms: config.attempt_timeout.as_millis() as u64,
            }),
        };

        match outcome {
            Ok(value) => {
                if state.attempts > 1 {
                    debug!(
                        task = %task_name,
                        attempts = state.attempts,
                        "Task recovered after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) if state.attempts >= max_attempts => {
                warn!(
                    task = %task_name,
                    attempts = state.attempts,
                    error = %e,
                    "Retry budget exhausted"
                );
                return Err(e);
            }
            Err(e) => {
                let delay = state.next_delay(config.max_retry_delay);
                warn!(
                    task = %task_name,
                    attempt = state.attempts,
                    max_attempts,
                    error = %e,
                    "Task failed, retrying in {:?}",
                    delay
                );
                sleep(delay).await;
            }
        }
    }
}
