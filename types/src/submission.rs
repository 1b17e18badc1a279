//! Submission ids: the correlation handle of a drafted form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::TypesError;

/// Freshly generated (v4) id of a drafted form, unrelated to the identity
/// that drafted it. Doubles as the Draft entry key and the durable record key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| TypesError::InvalidUuid(raw.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Canonical (lowercase, hyphenated) string form.
    pub fn to_key(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SubmissionId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(SubmissionId::generate(), SubmissionId::generate());
    }

    #[test]
    fn key_is_canonical() {
        let id = SubmissionId::parse("{6F1C2E4A-0B6D-4B8E-9F3A-2C1D0E9F8A7B}").unwrap();
        assert_eq!(id.to_key(), "6f1c2e4a-0b6d-4b8e-9f3a-2c1d0e9f8a7b");
    }
}
