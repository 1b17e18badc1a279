//! Abstract storage traits for the clinical intake backend.
//!
//! Every backend (in-memory, LMDB, test doubles) implements these traits.
//! The rest of the codebase depends only on the traits.

pub mod error;
pub mod form;
pub mod identity;
pub mod session;

pub use error::StoreError;
pub use form::FormStore;
pub use identity::IdentityStore;
pub use session::SessionStore;
