use intake_store::StoreError;
use thiserror::Error;

/// Failures of a gated verification call.
///
/// The `Display` text is the message shown to the caller.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Malformed token.")]
    MalformedToken,

    #[error("Doctor ID is not a valid UUID.")]
    InvalidIdentityFormat,

    #[error("Token does not match.")]
    NoActiveSession,

    #[error("Token does not match.")]
    StepMismatch,

    #[error("Token does not match.")]
    BadSignature,

    #[error("Invalid date format: '{0}'. Please use YYYY-MM-DD format.")]
    InvalidDate(String),

    #[error("session store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl VerificationError {
    /// True when no business-level answer is possible (the store is down).
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
