//! Nullable clock: deterministic time for testing.

use chrono::{DateTime, TimeZone, Utc};
use intake_types::Clock;
use std::sync::Mutex;

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
pub struct NullClock {
    current: Mutex<DateTime<Utc>>,
}

impl NullClock {
    /// Start at `initial_secs` seconds after the Unix epoch.
    pub fn new(initial_secs: i64) -> Self {
        let start = Utc
            .timestamp_opt(initial_secs, 0)
            .single()
            .unwrap_or_default();
        Self {
            current: Mutex::new(start),
        }
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: i64) {
        let mut current = self.current.lock().unwrap();
        *current += chrono::Duration::seconds(secs);
    }

    /// Set the time to a specific instant.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock().unwrap() = at;
    }
}

impl Clock for NullClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}
