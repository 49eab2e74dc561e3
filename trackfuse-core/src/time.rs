//! Time sources
//!
//! All timestamps inside the engine are milliseconds since the Unix epoch.
//! Scanner batches arrive stamped in seconds and are converted at the
//! boundary; GPS fixes may arrive without any timestamp, in which case the
//! boundary asks a [`TimeSource`] for the current wall-clock time.

/// Timestamp in milliseconds since epoch
pub type Timestamp = u64;

/// Milliseconds per second, for the seconds→ms conversion at the boundary
pub const MS_PER_SECOND: u64 = 1000;

/// Source of time for the system
pub trait TimeSource {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time
    fn is_wall_clock(&self) -> bool;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Create a source frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Jump to an absolute time
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move forward by `ms` milliseconds
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// Convert a seconds timestamp to milliseconds, `None` on overflow
pub fn seconds_to_ms(seconds: u64) -> Option<Timestamp> {
    seconds.checked_mul(MS_PER_SECOND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);

        time.set(42);
        assert_eq!(time.now(), 42);
        assert!(!time.is_wall_clock());
    }

    #[test]
    fn system_time_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemTime.now() > 1_577_836_800_000);
        assert!(SystemTime.is_wall_clock());
    }

    #[test]
    fn seconds_conversion() {
        assert_eq!(seconds_to_ms(1_700_000_000), Some(1_700_000_000_000));
        assert_eq!(seconds_to_ms(u64::MAX), None);
    }
}
