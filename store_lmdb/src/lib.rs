//! LMDB storage backend for the clinical intake backend.
//!
//! Implements the durable traits from `intake-store` using the `heed` LMDB
//! bindings. Each logical store maps to one LMDB database within a single
//! environment.

pub mod environment;
pub mod error;
pub mod form;
pub mod identity;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use form::LmdbFormStore;
pub use identity::LmdbIdentityStore;
