#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry a fallible operation with exponential backoff.
//!
//! The operation is attempted up to a fixed budget, sleeping
//! `base_delay * 2^attempt` between failures and stopping at the first
//! success. If every attempt fails, the final error is returned wrapped in
//! [`RetryError::Exhausted`] together with the attempt count.
//!
//! - [`retry()`] - the one-call helper
//! - [`retry::Retrier`] - the configurable loop behind it (trailing sleep,
//!   value-returning and async variants, fake clocks for tests)
//! - [`RetryConfig`] - serde-friendly settings
//!
//! # Attempt budget
//!
//! The budget counts **total** invocations, the first one included.
//! `retry(3, ..)` calls the operation at most three times.
//!
//! # Logging
//!
//! With the `tracing` feature enabled, each failed attempt is logged at
//! `debug` and exhaustion at `warn`.
//!
//! # Examples
//!
//! ```rust
//! use retrier::retry;
//! use std::time::Duration;
//!
//! let mut calls = 0;
//! let result = retry(3, Duration::from_millis(1), || {
//!     calls += 1;
//!     if calls < 2 {
//!         Err(std::io::Error::other("connection refused"))
//!     } else {
//!         Ok(())
//!     }
//! });
//!
//! assert!(result.is_ok());
//! assert_eq!(calls, 2);
//! ```

pub mod config;
pub mod error;
pub mod retry;

pub use config::RetryConfig;
pub use error::RetryError;

use std::time::Duration;

/// Run `operation` up to `retries` times, backing off exponentially.
///
/// `retries` is the total attempt count including the first attempt. After
/// failed attempt `n` (0-indexed) the calling thread sleeps
/// `base_delay * 2^n`, except after the final attempt where the error is
/// returned straight away.
///
/// A budget of zero never invokes `operation` and returns `Ok(())`.
///
/// # Errors
///
/// [`RetryError::Exhausted`] with `attempts == retries` and the error of the
/// final attempt as its source.
///
/// # Examples
///
/// ```rust
/// use retrier::retry;
/// use std::time::Duration;
///
/// let err = retry(2, Duration::ZERO, || Err::<(), _>(std::io::Error::other("timeout")))
///     .unwrap_err();
///
/// assert_eq!(err.to_string(), "retry failed after 2 attempts: timeout");
/// ```
pub fn retry<F, E>(retries: u32, base_delay: Duration, operation: F) -> Result<(), RetryError<E>>
where
    F: FnMut() -> Result<(), E>,
{
    retry::Retrier::new(retries, base_delay).run(operation)
}

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use retrier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::RetryConfig;
    pub use crate::error::RetryError;
    pub use crate::retry;
    pub use crate::retry::{RecordingSleeper, Retrier, RetrierBuilder, Sleeper, ThreadSleeper};
}
