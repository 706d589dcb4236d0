//! Retry wrappers for transient failures.
//!
//! [`safe_execute`] awaits an operation and classifies its error; on top of
//! it, [`retry_execute`] re-runs the operation under a [`RetryPolicy`] with
//! exponential backoff. Permanent errors (validation, not-found, duplicate)
//! are never retried, so bad input fails fast no matter the policy.

use crate::error::{DbError, DbResult};
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Backoff settings for [`retry_execute`].
///
/// `max_retries` counts retries, not attempts: an operation runs at most
/// `max_retries + 1` times.
///
/// ```ignore
/// use pgboard::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_retries(5)
///     .with_max_delay(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many times a failed operation is re-run.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the ceiling the growing delay never exceeds.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the factor the delay grows by between attempts.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    fn next_delay(&self, current: Duration) -> Duration {
        let scaled = current.mul_f64(self.backoff_multiplier.max(1.0));
        if scaled > self.max_delay {
            self.max_delay
        } else {
            scaled
        }
    }
}

/// Await `op`, folding its error into the [`DbError`] taxonomy.
///
/// Already-classified errors pass through unchanged; raw driver errors are
/// classified by [`DbError::from_db_error`]. Nothing is swallowed.
pub async fn safe_execute<T, E, F>(op: F) -> DbResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DbError>,
{
    op.await.map_err(Into::into)
}

/// Run `op` under `policy`, retrying transient failures.
///
/// `op` is a factory invoked once per attempt. The delay before each retry
/// starts at `initial_delay` and is multiplied by `backoff_multiplier`,
/// capped at `max_delay`. When retries run out the last error is returned.
pub async fn retry_execute<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> DbResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<DbError>,
{
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 0;
    loop {
        match safe_execute(op()).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_permanent() => return Err(err),
            Err(err) if attempt >= policy.max_retries => return Err(err),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %_err,
                    "retrying transient failure"
                );
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay);
                attempt += 1;
            }
        }
    }
}
