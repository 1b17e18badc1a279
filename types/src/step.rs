//! Verification steps.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Progress of an identity through the three ordered checks.
///
/// The numeric value is what the Session Store records for the identity and
/// what a verification token claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    /// The identity exists.
    Identity = 1,
    /// The name pair matches the identity.
    Username = 2,
    /// The date of birth matches the identity. Terminal.
    Dob = 3,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::Identity, Step::Username, Step::Dob];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// The Session Store representation of this step.
    pub fn as_stored(self) -> &'static str {
        match self {
            Step::Identity => "1",
            Step::Username => "2",
            Step::Dob => "3",
        }
    }

    pub fn from_number(n: u8) -> Result<Self, TypesError> {
        match n {
            1 => Ok(Step::Identity),
            2 => Ok(Step::Username),
            3 => Ok(Step::Dob),
            other => Err(TypesError::InvalidStep(other.to_string())),
        }
    }

    /// The step preceding this one, whose token gates it.
    pub fn previous(self) -> Option<Step> {
        match self {
            Step::Identity => None,
            Step::Username => Some(Step::Identity),
            Step::Dob => Some(Step::Username),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Step::Dob
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> u8 {
        step.number()
    }
}

impl TryFrom<u8> for Step {
    type Error = TypesError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Step::from_number(n)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored())
    }
}
