//! Fixed-budget retry loop with exponential backoff.

use super::sleeper::{Sleeper, ThreadSleeper};
use crate::config::RetryConfig;
use crate::error::RetryError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Retries an operation a fixed number of times with exponential backoff.
///
/// After failed attempt `n` (0-indexed) the retrier waits
/// `base_delay * 2^n` before trying again.
///
/// # Attempt budget
///
/// `attempts` is the **total** number of invocations, including the first
/// one. `attempts(3)` means "call at most three times", not "call once and
/// retry three more times".
///
/// # Trailing sleep
///
/// By default nothing is slept after the final failed attempt, since no
/// further attempt follows. Set [`RetrierBuilder::trailing_sleep`] to keep
/// the older timing where the final failure is also followed by a full
/// backoff before the error is returned.
///
/// # Mathematical Formula
///
/// ```text
/// delay(n)      = base_delay * (1 << n)                  saturating
/// total_backoff = base_delay * (2^(attempts - 1) - 1)    without trailing sleep
///               = base_delay * (2^attempts - 1)          with trailing sleep
/// ```
///
/// # Examples
///
/// ```rust
/// use retrier::retry::Retrier;
/// use std::time::Duration;
///
/// let retrier = Retrier::builder()
///     .attempts(5)
///     .base_delay(Duration::from_millis(1))
///     .build();
///
/// let mut calls = 0;
/// let result = retrier.run_with_value(|| {
///     calls += 1;
///     if calls < 3 {
///         Err(std::io::Error::other("not yet"))
///     } else {
///         Ok(calls)
///     }
/// });
///
/// assert_eq!(result.unwrap(), 3);
/// ```
#[derive(Clone)]
pub struct Retrier {
    attempts: u32,
    base_delay: Duration,
    trailing_sleep: bool,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for Retrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("attempts", &self.attempts)
            .field("base_delay", &self.base_delay)
            .field("trailing_sleep", &self.trailing_sleep)
            .field("sleeper", &"<sleeper>")
            .finish()
    }
}

impl Default for Retrier {
    /// Defaults: 3 attempts, 100ms base delay, no trailing sleep, real sleeps.
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Retrier {
    /// Create a retrier with the given total attempt budget and base delay.
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self::builder()
            .attempts(attempts)
            .base_delay(base_delay)
            .build()
    }

    /// Create a new builder for configuring a retrier.
    pub fn builder() -> RetrierBuilder {
        RetrierBuilder::default()
    }

    /// Create a retrier from a deserialized [`RetryConfig`].
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::builder()
            .attempts(config.attempts)
            .base_delay(config.base_delay)
            .trailing_sleep(config.trailing_sleep)
            .build()
    }

    /// Total number of times the operation may be invoked.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Scaling unit of the backoff.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Whether the final failed attempt is followed by a backoff.
    pub fn trailing_sleep(&self) -> bool {
        self.trailing_sleep
    }

    /// Backoff after failed attempt `attempt` (0-indexed): `base_delay * 2^attempt`.
    ///
    /// The power of two is an integer shift that saturates at `u32::MAX` for
    /// exponents of 32 and above; the product saturates at [`Duration::MAX`].
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Total time slept when every attempt fails.
    pub fn total_backoff(&self) -> Duration {
        let sleeps = if self.trailing_sleep {
            self.attempts
        } else {
            self.attempts.saturating_sub(1)
        };

        // Sum of the first 32 delays is base * (2^n - 1); every later delay
        // is pinned at base * u32::MAX.
        let doubling = sleeps.min(32);
        let geometric = u32::try_from((1u64 << doubling) - 1).unwrap_or(u32::MAX);
        let total = self.base_delay.saturating_mul(geometric);

        if sleeps > 32 {
            total.saturating_add(self.delay_for_attempt(32).saturating_mul(sleeps - 32))
        } else {
            total
        }
    }

    /// Backoff to apply after `attempt` failed, or `None` when nothing is slept.
    fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        let is_final = attempt.saturating_add(1) >= self.attempts;
        if is_final && !self.trailing_sleep {
            None
        } else {
            Some(self.delay_for_attempt(attempt))
        }
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// A budget of zero never invokes the operation and returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// [`RetryError::Exhausted`] carrying the attempt count and the error of
    /// the final attempt.
    pub fn run<F, E>(&self, operation: F) -> Result<(), RetryError<E>>
    where
        F: FnMut() -> Result<(), E>,
    {
        match self.run_with_value(operation) {
            Err(RetryError::NoAttempts) => Ok(()),
            other => other,
        }
    }

    /// Like [`run`](Self::run), but returns the value of the successful attempt.
    ///
    /// # Errors
    ///
    /// - [`RetryError::Exhausted`] when every attempt failed.
    /// - [`RetryError::NoAttempts`] when the budget is zero; the operation is
    ///   not invoked.
    pub fn run_with_value<F, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        let mut last_error = None;

        for attempt in 0..self.attempts {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last_error = Some(err);
                    if let Some(delay) = self.backoff_after(attempt) {
                        self.log_failure(attempt, delay);
                        self.sleeper.sleep(delay);
                    }
                }
            }
        }

        self.exhausted(last_error)
    }

    /// Async counterpart of [`run_with_value`](Self::run_with_value).
    ///
    /// Backoff uses [`tokio::time::sleep`], so the configured
    /// [`Sleeper`] is not consulted and the executor is free while waiting.
    ///
    /// # Errors
    ///
    /// Same as [`run_with_value`](Self::run_with_value).
    ///
    /// # Panics
    ///
    /// Panics if a backoff is needed while not running inside a tokio runtime
    /// with the time driver enabled, as [`tokio::time::sleep`] does.
    pub async fn run_async<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut last_error = None;

        for attempt in 0..self.attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last_error = Some(err);
                    if let Some(delay) = self.backoff_after(attempt) {
                        self.log_failure(attempt, delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        self.exhausted(last_error)
    }

    fn exhausted<T, E>(&self, last_error: Option<E>) -> Result<T, RetryError<E>> {
        match last_error {
            Some(source) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(attempts = self.attempts, "retry budget exhausted");

                Err(RetryError::Exhausted {
                    attempts: self.attempts,
                    source,
                })
            }
            None => Err(RetryError::NoAttempts),
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn log_failure(&self, attempt: u32, delay: Duration) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = attempt + 1,
            attempts = self.attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "attempt failed, backing off"
        );
    }
}

/// Builder for configuring a [`Retrier`].
///
/// # Examples
///
/// ```rust
/// use retrier::retry::Retrier;
/// use std::time::Duration;
///
/// let retrier = Retrier::builder()
///     .attempts(4)
///     .base_delay(Duration::from_millis(250))
///     .trailing_sleep(true)
///     .build();
///
/// assert_eq!(retrier.delay_for_attempt(2), Duration::from_secs(1));
/// ```
#[derive(Default)]
pub struct RetrierBuilder {
    attempts: Option<u32>,
    base_delay: Option<Duration>,
    trailing_sleep: bool,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl fmt::Debug for RetrierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrierBuilder")
            .field("attempts", &self.attempts)
            .field("base_delay", &self.base_delay)
            .field("trailing_sleep", &self.trailing_sleep)
            .finish_non_exhaustive()
    }
}

impl RetrierBuilder {
    /// Set the total attempt budget, first attempt included.
    ///
    /// Default: 3
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Set the scaling unit of the backoff.
    ///
    /// Default: 100ms
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Also back off after the final failed attempt.
    ///
    /// Default: false
    pub fn trailing_sleep(mut self, enabled: bool) -> Self {
        self.trailing_sleep = enabled;
        self
    }

    /// Replace the blocking sleeper used by [`Retrier::run`].
    ///
    /// Default: [`ThreadSleeper`]
    pub fn sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Some(Arc::new(sleeper));
        self
    }

    /// Build the `Retrier`, using defaults for anything unset.
    pub fn build(self) -> Retrier {
        Retrier {
            attempts: self.attempts.unwrap_or(DEFAULT_ATTEMPTS),
            base_delay: self.base_delay.unwrap_or(DEFAULT_BASE_DELAY),
            trailing_sleep: self.trailing_sleep,
            sleeper: self.sleeper.unwrap_or_else(|| Arc::new(ThreadSleeper)),
        }
    }
}
