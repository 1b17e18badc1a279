use intake_store::StoreError;
use intake_verification::VerificationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Token(#[from] VerificationError),

    #[error("Session not found")]
    NotFound,

    #[error("Data with this ID already exists")]
    AlreadyCommitted,

    #[error("{0}")]
    ValidationFailed(String),

    #[error("queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("attachment write failed: {0}")]
    AttachmentWrite(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl FormError {
    /// Store, queue or disk trouble: no business-level answer is possible.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            Self::Token(e) => e.is_infrastructure(),
            Self::QueueUnavailable(_) | Self::AttachmentWrite(_) | Self::StoreUnavailable(_) => {
                true
            }
            Self::NotFound | Self::AlreadyCommitted | Self::ValidationFailed(_) => false,
        }
    }
}
