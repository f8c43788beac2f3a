//! Retry loop and backoff implementation.
//!
//! # Key Types
//!
//! - [`Retrier`] - Fixed attempt budget with exponential backoff
//! - [`Sleeper`] - Seam for the blocking delay, with [`ThreadSleeper`] and
//!   the fake-clock [`RecordingSleeper`]
//!
//! # Examples
//!
//! ```rust
//! use retrier::retry::Retrier;
//! use std::time::Duration;
//!
//! let retrier = Retrier::new(3, Duration::from_millis(1));
//!
//! let result = retrier.run(|| {
//!     // Your operation here
//!     Ok::<_, std::io::Error>(())
//! });
//! assert!(result.is_ok());
//! ```

mod exponential;
mod sleeper;

pub use exponential::{Retrier, RetrierBuilder};
pub use sleeper::{RecordingSleeper, Sleeper, ThreadSleeper};
