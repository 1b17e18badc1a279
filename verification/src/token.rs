//! Step tokens: decoding, issuing and validation.
//!
//! A token travels as JSON text, `{"id": "<uuid>", "step": <n>}`, optionally
//! with `"sig"` when a signing secret is configured. Validation only checks
//! that the claimed step equals the step the Session Store records for the
//! identity (compared as text); it does not check that the caller is at the
//! right point of the sequence unless strict step order is enabled.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use intake_store::SessionStore;
use intake_types::{IdentityId, Step};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;

use crate::VerificationError;

type HmacSha256 = Hmac<Sha256>;

/// The fields a presented token claims, before any validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenClaim {
    pub identity: String,
    /// The claimed step in its textual form: `1` and `"1"` both claim `"1"`.
    pub step: String,
    pub sig: Option<String>,
}

impl TokenClaim {
    /// Decode the credential. Anything that is not a JSON object with a
    /// string `id` and a numeric or string `step` is malformed.
    pub fn decode(raw: &str) -> Result<Self, VerificationError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|_| VerificationError::MalformedToken)?;
        let obj = value.as_object().ok_or(VerificationError::MalformedToken)?;

        let identity = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or(VerificationError::MalformedToken)?
            .to_string();
        let step = match obj.get("step") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => return Err(VerificationError::MalformedToken),
        };
        let sig = match obj.get("sig") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(VerificationError::MalformedToken),
        };

        Ok(Self {
            identity,
            step,
            sig,
        })
    }
}

/// A token handed back to the client after a successful step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub id: IdentityId,
    pub step: Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl IssuedToken {
    /// The credential text the client presents on the next call.
    pub fn to_credential(&self) -> String {
        // A struct of a uuid, an integer and an optional string always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// HMAC-SHA256 over `"{identity}:{step}"`.
#[derive(Clone)]
pub struct TokenSigner {
    keyed: HmacSha256,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, VerificationError> {
        let keyed = <HmacSha256 as Mac>::new_from_slice(secret.as_ref())
            .map_err(|_| VerificationError::BadSignature)?;
        Ok(Self { keyed })
    }

    fn mac(&self, identity: &IdentityId, step: &str) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(identity.to_key().as_bytes());
        mac.update(b":");
        mac.update(step.as_bytes());
        mac
    }

    pub fn sign(&self, identity: &IdentityId, step: Step) -> String {
        hex::encode(self.mac(identity, step.as_stored()).finalize().into_bytes())
    }

    pub fn verify(
        &self,
        identity: &IdentityId,
        step: &str,
        sig: Option<&str>,
    ) -> Result<(), VerificationError> {
        let sig = sig.ok_or(VerificationError::BadSignature)?;
        let bytes = hex::decode(sig).map_err(|_| VerificationError::BadSignature)?;
        self.mac(identity, step)
            .verify_slice(&bytes)
            .map_err(|_| VerificationError::BadSignature)
    }
}

/// Checks presented tokens against the Session Store and issues new ones.
pub struct TokenValidator {
    sessions: Arc<dyn SessionStore>,
    signer: Option<TokenSigner>,
    strict_step_order: bool,
}

impl TokenValidator {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions,
            signer: None,
            strict_step_order: false,
        }
    }

    /// Sign issued tokens and require a valid signature on presented ones.
    pub fn with_signer(mut self, signer: TokenSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Also require the claimed step to equal the step the operation expects.
    pub fn with_strict_step_order(mut self, strict: bool) -> Self {
        self.strict_step_order = strict;
        self
    }

    pub fn issue(&self, identity: IdentityId, step: Step) -> IssuedToken {
        IssuedToken {
            id: identity,
            step,
            sig: self.signer.as_ref().map(|s| s.sign(&identity, step)),
        }
    }

    /// Validate `raw` and return the identity it speaks for.
    ///
    /// `expected` is the step the calling operation is gated on, or `None`
    /// when any currently valid token will do.
    pub fn validate(
        &self,
        raw: &str,
        expected: Option<Step>,
    ) -> Result<IdentityId, VerificationError> {
        let claim = TokenClaim::decode(raw)?;
        let identity = IdentityId::parse(&claim.identity)
            .map_err(|_| VerificationError::InvalidIdentityFormat)?;

        if let Some(signer) = &self.signer {
            signer.verify(&identity, &claim.step, claim.sig.as_deref())?;
        }

        if let Some(expected) = expected {
            if claim.step != expected.as_stored() {
                if self.strict_step_order {
                    return Err(VerificationError::StepMismatch);
                }
                tracing::debug!(
                    %identity,
                    claimed = %claim.step,
                    expected = %expected,
                    "token step differs from the gated step"
                );
            }
        }

        let stored = self
            .sessions
            .get(&identity.to_key())?
            .ok_or(VerificationError::NoActiveSession)?;
        if stored != claim.step {
            return Err(VerificationError::StepMismatch);
        }
        Ok(identity)
    }
}
