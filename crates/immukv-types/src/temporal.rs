use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Wall-clock timestamp in Unix epoch milliseconds.
///
/// Timestamps are informational: ordering comes from [`crate::Sequence`],
/// never from the clock. A stored timestamp must be strictly positive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct TimestampMs(u64);

impl TimestampMs {
    /// Validate a timestamp read from a stored document.
    pub fn new(ms: i64) -> Result<Self, TypeError> {
        if ms <= 0 {
            return Err(TypeError::InvalidTimestamp(ms));
        }
        Ok(Self(ms as u64))
    }

    /// Timestamp for the given instant. Instants before the epoch clamp to 1ms.
    pub fn from_system_time(time: SystemTime) -> Self {
        let ms = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(ms.max(1))
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, saturating at zero.
    pub fn saturating_since(self, earlier: TimestampMs) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl TryFrom<i64> for TimestampMs {
    type Error = TypeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TimestampMs> for i64 {
    fn from(ts: TimestampMs) -> Self {
        ts.0 as i64
    }
}

impl fmt::Debug for TimestampMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimestampMs({})", self.0)
    }
}

impl fmt::Display for TimestampMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
