//! Pluggable blocking delay between attempts.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Performs the backoff delay between attempts.
///
/// Production code uses [`ThreadSleeper`]. Tests swap in
/// [`RecordingSleeper`] to observe the schedule without waiting on a real
/// clock.
pub trait Sleeper: Send + Sync {
    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the calling thread with [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// A fake clock: returns immediately and records every requested delay.
///
/// Clones share the same log, so a clone can be handed to a
/// [`Retrier`](super::Retrier) while the original is kept for assertions.
///
/// # Examples
///
/// ```
/// use retrier::retry::{RecordingSleeper, Retrier};
/// use std::time::Duration;
///
/// let sleeper = RecordingSleeper::new();
/// let retrier = Retrier::builder()
///     .attempts(3)
///     .base_delay(Duration::from_secs(1))
///     .sleeper(sleeper.clone())
///     .build();
///
/// let _ = retrier.run(|| Err::<(), _>(std::io::Error::other("down")));
///
/// assert_eq!(
///     sleeper.recorded(),
///     vec![Duration::from_secs(1), Duration::from_secs(2)]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    log: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create a sleeper with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of all requested delays.
    pub fn total(&self) -> Duration {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(*d))
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}
