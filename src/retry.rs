//! Outer retry policy for the execute-and-fetch sequence
//!
//! A failed attempt is logged, followed by a pause, and then the whole unit of
//! work runs again. With the default [`RetryConfig`] the pause is a fixed five
//! seconds; a backoff multiplier and jitter can be configured.
//!
//! # Example
//!
//! ```no_run
//! use ukg_bi::config::RetryConfig;
//! use ukg_bi::error::Error;
//! use ukg_bi::retry::execute_with_retry;
//! use ukg_bi::sleeper::TokioSleeper;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let text = execute_with_retry(&config, &TokioSleeper, |_attempt| async {
//!     Ok::<_, Error>("payload".to_string())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::sleeper::Sleeper;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if re-running the unit of work might succeed
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Caller mistakes, nothing remote can fix them
            Error::Config { .. } | Error::UnknownReport(_) => false,
            // Already the outcome of a retry loop
            Error::RetriesExhausted { .. } => false,
            // Everything raised while talking to the service
            Error::Authentication(_)
            | Error::Submission(_)
            | Error::Transport(_)
            | Error::Network(_)
            | Error::Fault { .. }
            | Error::ReportFailed { .. }
            | Error::ReportNotReady { .. }
            | Error::Decode(_) => true,
        }
    }
}

/// Run `operation` until it succeeds or the attempt budget is spent
///
/// The operation receives the 1-based attempt number. A non-retryable error
/// is returned unchanged right away; when every attempt fails with retryable
/// errors the last one is wrapped in [`Error::RetriesExhausted`].
pub async fn execute_with_retry<F, Fut, T>(
    config: &RetryConfig,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.delay.min(config.max_delay);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        phase = "retry",
                        attempts = attempt,
                        "execute-and-fetch succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let wait = if config.jitter { add_jitter(delay) } else { delay };

                tracing::warn!(
                    phase = "retry",
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = wait.as_millis() as u64,
                    "execute-and-fetch failed, retrying"
                );

                sleeper.sleep(wait).await;

                delay = next_delay(delay, config);
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                tracing::error!(
                    phase = "retry",
                    error = %e,
                    attempts = attempt,
                    "execute-and-fetch failed after all retry attempts exhausted"
                );
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                tracing::error!(phase = "retry", error = %e, "execute-and-fetch failed with non-retryable error");
                return Err(e);
            }
        }
    }
}

/// Scale `delay` by the backoff multiplier, capped at `max_delay`
///
/// A product that is not a valid duration (overflow, NaN, negative) caps out.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
        .map_or(config.max_delay, |next| next.min(config.max_delay))
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`, saturating at `Duration::MAX`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * jitter_factor)
        .map_or(Duration::MAX, |extra| delay.saturating_add(extra))
}
