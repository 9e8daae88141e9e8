//! Retry policy implementation with linear backoff.
//!
//! Operations report each attempt as a tagged [`Attempt`], so the decision to
//! retry lives with the caller that understands the failure and the loop here
//! only counts, sleeps and gives up.

use std::{fmt::Display, future::Future, time::Duration};
use tracing::{debug, warn};

/// Outcome of a single attempt of a retried operation.
#[derive(Debug)]
pub enum Attempt<T, E> {
    /// The operation succeeded.
    Success(T),
    /// The operation failed transiently and may be re-issued unchanged.
    Retryable(E),
    /// The operation failed and must not be re-issued.
    Fatal(E),
}

impl<T, E> Attempt<T, E> {
    /// Tag a result using the given retryability classifier.
    pub fn classify(result: Result<T, E>, is_retryable: impl FnOnce(&E) -> bool) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) if is_retryable(&error) => Self::Retryable(error),
            Err(error) => Self::Fatal(error),
        }
    }
}

/// Terminal failure of a retried operation.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-retryable failure surfaced; no further attempts were made.
    Fatal(E),
    /// Every attempt failed transiently.
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error reported by the last attempt
        last: E,
    },
}

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_retries: u32,
    /// Multiplier applied to the attempt number
    pub backoff_factor: u32,
    /// Time unit the backoff is expressed in
    pub backoff_unit: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 2,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff factor.
    #[must_use]
    pub const fn with_backoff_factor(mut self, factor: u32) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Set the backoff time unit.
    #[must_use]
    pub const fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }
}

/// Retry policy for executing operations with automatic retries.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Calculate the delay before re-issuing after `attempt` failures.
    ///
    /// The delay grows linearly: `factor × attempt × unit`, saturating at
    /// [`Duration::MAX`].
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.config
            .backoff_unit
            .checked_mul(self.config.backoff_factor.saturating_mul(attempt))
            .unwrap_or(Duration::MAX)
    }

    /// Execute an async operation, sleeping on the tokio timer between attempts.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Fatal`] on the first fatal attempt and
    /// [`RetryError::Exhausted`] once `max_retries` attempts were retryable.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
        E: Display,
    {
        self.execute_with_sleep(operation, tokio::time::sleep).await
    }

    /// Execute an async operation with a caller-supplied sleep.
    ///
    /// The operation receives the 0-indexed attempt number.
    ///
    /// # Errors
    ///
    /// Same as [`RetryPolicy::execute`].
    pub async fn execute_with_sleep<F, Fut, T, E, S, SFut>(
        &self,
        mut operation: F,
        mut sleep: S,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T, E>>,
        E: Display,
        S: FnMut(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt).await {
                Attempt::Success(value) => return Ok(value),
                Attempt::Fatal(error) => return Err(RetryError::Fatal(error)),
                Attempt::Retryable(error) => {
                    warn!(attempt, error = %error, "Transient failure, retrying");
                    attempt += 1;
                    if attempt >= self.config.max_retries {
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last: error,
                        });
                    }
                    let delay = self.delay_for_attempt(attempt);
                    debug!(delay_ms = delay.as_millis(), "Backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}
