//! Identity ids and the read-only identity record owned by the system of record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::TypesError;

/// Key of an identity record (a doctor id). Always a syntactically valid UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(Uuid);

impl IdentityId {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a claimed identity. Accepts every textual form `uuid` accepts
    /// (hyphenated, simple, braced, urn).
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| TypesError::InvalidUuid(raw.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Canonical (lowercase, hyphenated) form, used as the Step entry key.
    pub fn to_key(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for IdentityId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A doctor as recorded by the external system of record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: IdentityId,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
}

impl IdentityRecord {
    /// Exact, case-sensitive comparison, the way the system of record filters.
    pub fn has_name(&self, first_name: &str, last_name: &str) -> bool {
        self.first_name == first_name && self.last_name == last_name
    }
}
