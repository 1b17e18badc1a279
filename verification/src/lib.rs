//! Doctor identity verification.
//!
//! Three ordered checks, each gated by a step token:
//! 1. **Identity**: the claimed doctor id exists in the registry.
//! 2. **Username**: the name pair belongs to that doctor.
//! 3. **Date of birth**: the date of birth belongs to that doctor.
//!
//! Progress lives in the Session Store as a Step entry keyed by the doctor
//! id. A token is the client's copy of `{id, step}`; it is valid while it
//! equals what the store records.

pub mod error;
pub mod machine;
pub mod token;

pub use error::VerificationError;
pub use machine::{parse_dob, StepOutcome, VerificationMachine};
pub use token::{IssuedToken, TokenClaim, TokenSigner, TokenValidator};
