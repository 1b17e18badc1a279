//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, durable stores, identity registry,
//! message broker, sleeping) are abstracted behind traits. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod broker;
pub mod clock;
pub mod sleep;
pub mod store;

pub use broker::{NullBroker, PublishedMessage};
pub use clock::NullClock;
pub use sleep::NullSleep;
pub use store::{NullFormStore, NullIdentityStore};
