//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intake_forms::FormError;
use intake_verification::VerificationError;
use thiserror::Error;

use crate::Envelope;

/// Shown instead of internal detail when infrastructure fails.
pub const UNAVAILABLE_MESSAGE: &str = "Something went wrong. Try again later.";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Missing Authorization header")]
    MissingAuthorization,

    #[error("Invalid UUID format")]
    InvalidPathId,

    #[error("invalid form data: {0}")]
    BadMultipart(String),

    #[error("invalid request body: {0}")]
    BadJson(String),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("server error: {0}")]
    Server(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuthorization => StatusCode::UNAUTHORIZED,
            Self::InvalidPathId | Self::BadMultipart(_) | Self::BadJson(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Server(_) | Self::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ if self.is_infrastructure() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::OK,
        }
    }

    pub fn is_infrastructure(&self) -> bool {
        match self {
            Self::Verification(e) => e.is_infrastructure(),
            Self::Form(e) => e.is_infrastructure(),
            _ => false,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.is_infrastructure()
            || matches!(self, Self::Server(_) | Self::Metrics(_))
        {
            tracing::error!("request failed: {self}");
            UNAVAILABLE_MESSAGE.to_string()
        } else {
            tracing::warn!("request rejected: {self}");
            self.to_string()
        };
        (status, Json(Envelope::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_failures_are_ok_status() {
        let err = RpcError::Verification(VerificationError::StepMismatch);
        assert_eq!(err.status(), StatusCode::OK);
        let err = RpcError::Form(FormError::AlreadyCommitted);
        assert_eq!(err.status(), StatusCode::OK);
    }

    #[test]
    fn shape_problems_keep_their_status() {
        assert_eq!(RpcError::MissingAuthorization.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(RpcError::InvalidPathId.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RpcError::BadJson("eof".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn queue_outage_is_unavailable() {
        let err = RpcError::Form(FormError::QueueUnavailable("closed".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
