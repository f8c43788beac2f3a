//! Serializable retry settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry settings that can be embedded in an application's config file.
///
/// Every field is optional when deserializing; missing fields take the same
/// defaults as [`Retrier::builder`](crate::retry::Retrier::builder).
///
/// # Example
///
/// ```
/// use retrier::RetryConfig;
/// use retrier::retry::Retrier;
/// use std::time::Duration;
///
/// let config: RetryConfig = serde_json::from_str(r#"{ "attempts": 5, "base_delay_ms": 250 }"#).unwrap();
/// let retrier = Retrier::from_config(&config);
///
/// assert_eq!(retrier.attempts(), 5);
/// assert_eq!(retrier.base_delay(), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, first attempt included.
    pub attempts: u32,

    /// Backoff unit, written as whole milliseconds.
    ///
    /// Serializing a delay with a sub-millisecond part fails rather than
    /// rounding it away.
    #[serde(rename = "base_delay_ms", with = "duration_ms")]
    pub base_delay: Duration,

    /// Back off after the final failed attempt too.
    pub trailing_sleep: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(100),
            trailing_sleep: false,
        }
    }
}

mod duration_ms {
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Only whole milliseconds are representable; anything finer is an error.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() % 1_000_000 != 0 {
            return Err(S::Error::custom(format!(
                "base_delay {:?} is not a whole number of milliseconds",
                duration
            )));
        }
        let millis = u64::try_from(duration.as_millis()).map_err(|_| {
            S::Error::custom(format!(
                "base_delay {:?} does not fit in u64 milliseconds",
                duration
            ))
        })?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
