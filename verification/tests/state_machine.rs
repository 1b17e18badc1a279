use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use intake_nullables::{NullClock, NullIdentityStore};
use intake_session::MemorySessionStore;
use intake_store::SessionStore;
use intake_types::{IdentityId, IdentityRecord, Step};
use intake_verification::{
    StepOutcome, TokenSigner, TokenValidator, VerificationError, VerificationMachine,
};
use proptest::prelude::*;

const DOCTOR: &str = "dd0804db-35d4-4965-a7a2-ce6d3ffc2e7e";
const OTHER: &str = "5b0c4a2e-8f51-4a0c-9d83-0c3b8f1d2e11";

struct Harness {
    sessions: Arc<MemorySessionStore>,
    machine: VerificationMachine,
}

fn doctor(id: &str, first: &str, last: &str, dob: (i32, u32, u32)) -> IdentityRecord {
    IdentityRecord {
        id: IdentityId::parse(id).unwrap(),
        first_name: first.into(),
        last_name: last.into(),
        dob: NaiveDate::from_ymd_opt(dob.0, dob.1, dob.2).unwrap(),
    }
}

fn harness_with(validator: impl FnOnce(Arc<MemorySessionStore>) -> TokenValidator) -> Harness {
    let sessions = Arc::new(MemorySessionStore::with_clock(Arc::new(NullClock::new(1_000))));
    let identities = Arc::new(NullIdentityStore::with_records(vec![
        doctor(DOCTOR, "Asha", "Karki", (1980, 4, 12)),
        doctor(OTHER, "Bikash", "Thapa", (1975, 1, 30)),
    ]));
    let tokens = Arc::new(validator(sessions.clone()));
    let machine = VerificationMachine::new(sessions.clone(), identities, tokens);
    Harness { sessions, machine }
}

fn harness() -> Harness {
    harness_with(|s| TokenValidator::new(s))
}

fn token(id: &str, step: u8) -> String {
    format!(r#"{{"id":"{id}","step":{step}}}"#)
}

fn credential(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Advanced { token, .. } => token.to_credential(),
        StepOutcome::Rejected { message } => panic!("expected advance, got {message}"),
    }
}

#[test]
fn identity_step_records_step_one() {
    let h = harness();
    let outcome = h.machine.verify_identity(DOCTOR).unwrap();

    match &outcome {
        StepOutcome::Advanced { token, message } => {
            assert_eq!(token.id.to_key(), DOCTOR);
            assert_eq!(token.step, Step::Identity);
            assert_eq!(message, &format!("{DOCTOR}: Doctor ID is valid"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.sessions.get(DOCTOR).unwrap().as_deref(), Some("1"));
}

#[test]
fn unknown_identity_leaves_store_untouched() {
    let h = harness();
    let outcome = h
        .machine
        .verify_identity("00000000-0000-4000-8000-000000000000")
        .unwrap();
    assert_eq!(outcome.message(), "Invalid Doctor ID.");
    assert!(h.sessions.is_empty());
}

#[test]
fn malformed_identity_is_a_distinct_failure() {
    let h = harness();
    let err = h.machine.verify_identity("dd0804db").unwrap_err();
    assert!(matches!(err, VerificationError::InvalidIdentityFormat));
    assert_eq!(err.to_string(), "Doctor ID is not a valid UUID.");
    assert!(h.sessions.is_empty());
}

#[test]
fn full_sequence_reaches_terminal_step() {
    let h = harness();
    let t1 = credential(&h.machine.verify_identity(DOCTOR).unwrap());
    let t2 = credential(&h.machine.verify_username(&t1, "Asha", "Karki").unwrap());
    assert_eq!(h.sessions.get(DOCTOR).unwrap().as_deref(), Some("2"));

    let outcome = h.machine.verify_dob(&t2, "1980-04-12").unwrap();
    assert_eq!(outcome.message(), "Valid dob");
    assert_eq!(h.sessions.get(DOCTOR).unwrap().as_deref(), Some("3"));
}

#[test]
fn username_without_prior_identity_has_no_session() {
    let h = harness();
    let err = h
        .machine
        .verify_username(&token(DOCTOR, 1), "Asha", "Karki")
        .unwrap_err();
    assert!(matches!(err, VerificationError::NoActiveSession));
}

#[test]
fn stale_step_claim_does_not_match() {
    let h = harness();
    h.machine.verify_identity(DOCTOR).unwrap();
    let err = h
        .machine
        .verify_username(&token(DOCTOR, 2), "Asha", "Karki")
        .unwrap_err();
    assert!(matches!(err, VerificationError::StepMismatch));
    assert_eq!(err.to_string(), "Token does not match.");
    assert_eq!(h.sessions.get(DOCTOR).unwrap().as_deref(), Some("1"));
}

#[test]
fn another_doctors_name_is_rejected() {
    let h = harness();
    let t1 = credential(&h.machine.verify_identity(DOCTOR).unwrap());
    let outcome = h.machine.verify_username(&t1, "Bikash", "Thapa").unwrap();
    assert_eq!(outcome, StepOutcome::Rejected { message: "Invalid Username.".into() });
    assert_eq!(h.sessions.get(DOCTOR).unwrap().as_deref(), Some("1"));
}

#[test]
fn wrong_dob_is_rejected() {
    let h = harness();
    let t1 = credential(&h.machine.verify_identity(DOCTOR).unwrap());
    let t2 = credential(&h.machine.verify_username(&t1, "Asha", "Karki").unwrap());
    let outcome = h.machine.verify_dob(&t2, "1975-01-30").unwrap();
    assert_eq!(outcome.message(), "No matching dob found.");
    assert_eq!(h.sessions.get(DOCTOR).unwrap().as_deref(), Some("2"));
}

#[test]
fn malformed_dob_is_reported_before_any_store_access() {
    let h = harness();
    // No session exists, so reaching the store would report NoActiveSession.
    let err = h.machine.verify_dob("not even json", "not-a-date").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid date format: 'not-a-date'. Please use YYYY-MM-DD format."
    );
    assert!(h.sessions.is_empty());
}

#[test]
fn weak_check_lets_a_current_token_call_any_step() {
    let h = harness();
    let t1 = credential(&h.machine.verify_identity(DOCTOR).unwrap());
    // A step-1 token is still store-consistent, so the dob check accepts it.
    let outcome = h.machine.verify_dob(&t1, "1980-04-12").unwrap();
    assert!(outcome.is_advanced());
}

#[test]
fn strict_order_requires_the_gating_step() {
    let h = harness_with(|s| TokenValidator::new(s).with_strict_step_order(true));
    let t1 = credential(&h.machine.verify_identity(DOCTOR).unwrap());
    let err = h.machine.verify_dob(&t1, "1980-04-12").unwrap_err();
    assert!(matches!(err, VerificationError::StepMismatch));
}

#[test]
fn signed_sequence_rejects_bare_tokens() {
    let h = harness_with(|s| TokenValidator::new(s).with_signer(TokenSigner::new("secret").unwrap()));
    let t1 = credential(&h.machine.verify_identity(DOCTOR).unwrap());
    assert!(t1.contains("\"sig\""));

    let err = h
        .machine
        .verify_username(&token(DOCTOR, 1), "Asha", "Karki")
        .unwrap_err();
    assert!(matches!(err, VerificationError::BadSignature));
    assert!(h.machine.verify_username(&t1, "Asha", "Karki").unwrap().is_advanced());
}

#[test]
fn step_entries_expire_with_ttl() {
    let clock = Arc::new(NullClock::new(1_000));
    let sessions = Arc::new(MemorySessionStore::with_clock(clock.clone()));
    let identities = Arc::new(NullIdentityStore::with_records(vec![doctor(
        DOCTOR,
        "Asha",
        "Karki",
        (1980, 4, 12),
    )]));
    let tokens = Arc::new(TokenValidator::new(sessions.clone()));
    let machine = VerificationMachine::new(sessions.clone(), identities, tokens)
        .with_step_ttl(Some(Duration::from_secs(60)));

    let t1 = credential(&machine.verify_identity(DOCTOR).unwrap());
    clock.advance(61);
    let err = machine.verify_username(&t1, "Asha", "Karki").unwrap_err();
    assert!(matches!(err, VerificationError::NoActiveSession));
}

proptest! {
    #[test]
    fn mismatch_iff_claim_differs_from_stored(stored in 1u8..=3, claimed in 0u8..=9) {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions.set(DOCTOR, &stored.to_string(), None).unwrap();
        let validator = TokenValidator::new(sessions);

        let result = validator.validate(&token(DOCTOR, claimed), None);
        if claimed == stored {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(VerificationError::StepMismatch)));
        }
    }
}
