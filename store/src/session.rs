//! Session store trait.
//!
//! One key/value namespace holds two kinds of entries, told apart only by
//! key shape: Step entries (identity id -> "1" | "2" | "3") and Draft entries
//! (submission id -> serialized draft). There is no check-and-set; every
//! "read then write" sequence built on top of this trait can race.

use std::time::Duration;

use crate::StoreError;

pub trait SessionStore: Send + Sync {
    /// Current value for `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value and expiry.
    /// `ttl = None` means the entry never expires.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;
}
