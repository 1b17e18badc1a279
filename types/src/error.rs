//! Parse errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    #[error("invalid verification step: {0}")]
    InvalidStep(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),
}
