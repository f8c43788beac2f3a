//! Error returned when a retried operation never succeeds.

/// Result type for retried operations.
pub type Result<T, E> = std::result::Result<T, RetryError<E>>;

/// Failure of a retry loop.
///
/// Exhaustion is not a new kind of error: it wraps whatever the final attempt
/// produced and annotates it with the configured attempt count, so callers can
/// tell "gave up after N tries because of X" apart from their own failures.
///
/// # Examples
///
/// ```
/// use retrier::{retry, RetryError};
/// use std::time::Duration;
///
/// let result = retry(2, Duration::ZERO, || Err::<(), _>(std::io::Error::other("refused")));
///
/// match result {
///     Err(RetryError::Exhausted { attempts, source }) => {
///         assert_eq!(attempts, 2);
///         assert_eq!(source.to_string(), "refused");
///     }
///     other => panic!("unexpected result: {:?}", other),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every permitted attempt failed.
    #[error("retry failed after {attempts} attempts: {source}")]
    Exhausted {
        /// Configured number of attempts, all of which were used.
        attempts: u32,
        /// Error produced by the final attempt.
        #[source]
        source: E,
    },

    /// The attempt budget was zero, so there is no value to return.
    ///
    /// Only the value-returning entry points produce this; [`crate::retry()`]
    /// treats a zero budget as trivial success.
    #[error("retry attempted zero times")]
    NoAttempts,
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::NoAttempts => 0,
        }
    }

    /// The error from the final attempt, if any attempt was made.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Exhausted { source, .. } => Some(source),
            Self::NoAttempts => None,
        }
    }

    /// Consume the wrapper and return the final attempt's error.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } => Some(source),
            Self::NoAttempts => None,
        }
    }
}
