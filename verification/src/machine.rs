//! The three ordered verification checks.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use intake_store::{IdentityStore, SessionStore};
use intake_types::{IdentityId, IdentityRecord, Step};

use crate::token::{IssuedToken, TokenValidator};
use crate::VerificationError;

/// Result of a check that reached the identity registry.
///
/// A rejection is a business answer, not an error: the Session Store is left
/// unchanged and the caller may retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced { token: IssuedToken, message: String },
    Rejected { message: String },
}

impl StepOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Advanced { message, .. } | Self::Rejected { message } => message,
        }
    }
}

pub struct VerificationMachine {
    sessions: Arc<dyn SessionStore>,
    identities: Arc<dyn IdentityStore>,
    tokens: Arc<TokenValidator>,
    step_ttl: Option<Duration>,
}

impl VerificationMachine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        identities: Arc<dyn IdentityStore>,
        tokens: Arc<TokenValidator>,
    ) -> Self {
        Self {
            sessions,
            identities,
            tokens,
            step_ttl: None,
        }
    }

    /// Expire Step entries after `ttl`. Without it they never expire.
    pub fn with_step_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.step_ttl = ttl;
        self
    }

    pub fn tokens(&self) -> &Arc<TokenValidator> {
        &self.tokens
    }

    /// Step 1: the claimed doctor id exists in the registry.
    pub fn verify_identity(&self, claim: &str) -> Result<StepOutcome, VerificationError> {
        let identity =
            IdentityId::parse(claim).map_err(|_| VerificationError::InvalidIdentityFormat)?;

        if self.identities.get_identity(&identity)?.is_none() {
            tracing::warn!(%identity, "unknown doctor id");
            return Ok(StepOutcome::Rejected {
                message: "Invalid Doctor ID.".into(),
            });
        }

        let token = self.advance(identity, Step::Identity)?;
        Ok(StepOutcome::Advanced {
            token,
            message: format!("{identity}: Doctor ID is valid"),
        })
    }

    /// Step 2: the name pair belongs to the token's identity.
    pub fn verify_username(
        &self,
        token: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<StepOutcome, VerificationError> {
        let identity = self.tokens.validate(token, Some(Step::Identity))?;

        let matches = self.identities.find_by_name(first_name, last_name)?;
        if !contains(&matches, &identity) {
            tracing::warn!(%identity, "name pair does not match");
            return Ok(StepOutcome::Rejected {
                message: "Invalid Username.".into(),
            });
        }

        let token = self.advance(identity, Step::Username)?;
        Ok(StepOutcome::Advanced {
            token,
            message: "Username is valid".into(),
        })
    }

    /// Step 3: the date of birth belongs to the token's identity.
    ///
    /// The date is checked for shape before the token or any store is read.
    pub fn verify_dob(&self, token: &str, dob: &str) -> Result<StepOutcome, VerificationError> {
        let date = parse_dob(dob)?;
        let identity = self.tokens.validate(token, Some(Step::Username))?;

        let matches = self.identities.find_by_dob(date)?;
        if !contains(&matches, &identity) {
            tracing::warn!(%identity, "date of birth does not match");
            return Ok(StepOutcome::Rejected {
                message: "No matching dob found.".into(),
            });
        }

        let token = self.advance(identity, Step::Dob)?;
        Ok(StepOutcome::Advanced {
            token,
            message: "Valid dob".into(),
        })
    }

    fn advance(&self, identity: IdentityId, step: Step) -> Result<IssuedToken, VerificationError> {
        self.sessions
            .set(&identity.to_key(), step.as_stored(), self.step_ttl)?;
        tracing::info!(%identity, step = step.number(), "verification step passed");
        Ok(self.tokens.issue(identity, step))
    }
}

/// Parse a `YYYY-MM-DD` date of birth. Runs before any token or store check.
pub fn parse_dob(dob: &str) -> Result<NaiveDate, VerificationError> {
    NaiveDate::parse_from_str(dob, "%Y-%m-%d")
        .map_err(|_| VerificationError::InvalidDate(dob.to_string()))
}

fn contains(records: &[IdentityRecord], identity: &IdentityId) -> bool {
    records.iter().any(|r| r.id == *identity)
}
