//! Wait value helpers.

use std::time::Duration;

/// A lock wait expressed the way the lock service expects it: whole seconds.
///
/// Sub-second remainders round up so a short non-zero wait never degrades into a
/// single non-blocking attempt. Waits saturate at [`WaitTimeout::MAX_SECONDS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WaitTimeout {
    seconds: i64,
}

impl WaitTimeout {
    /// One year.
    pub const MAX_SECONDS: i64 = 365 * 24 * 60 * 60;

    /// Attempt once, do not block.
    pub const NO_WAIT: Self = Self { seconds: 0 };

    pub fn as_secs(&self) -> i64 {
        self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0
    }
}

impl From<Duration> for WaitTimeout {
    fn from(wait: Duration) -> Self {
        let mut seconds = wait.as_secs();
        if wait.subsec_nanos() > 0 {
            seconds = seconds.saturating_add(1);
        }
        let seconds = i64::try_from(seconds)
            .unwrap_or(i64::MAX)
            .min(Self::MAX_SECONDS);
        Self { seconds }
    }
}
