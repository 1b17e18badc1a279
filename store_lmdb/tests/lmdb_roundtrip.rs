//! LMDB-backed stores against a throwaway environment.

use std::sync::Arc;
use std::thread;

use chrono::{NaiveDate, TimeZone, Utc};
use intake_store::{FormStore, IdentityStore, StoreError};
use intake_store_lmdb::LmdbEnvironment;
use intake_types::{FormDocument, IdentityId, IdentityRecord, Position, SubmissionId};

fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).expect("open env");
    (dir, env)
}

fn document(id: SubmissionId) -> FormDocument {
    FormDocument {
        id,
        accomp_ident: "A-1".into(),
        age_identity: "30-40".into(),
        district: "Kathmandu".into(),
        files: None,
        position: Some(Position {
            lat: 27.67,
            lng: 85.35,
        }),
        province: "Bagmati".into(),
        status_condition: "stable".into(),
        status_disease: "dengue".into(),
        status_symptom: "fever".into(),
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap(),
    }
}

fn record(id: &str, first: &str, last: &str, dob: (i32, u32, u32)) -> IdentityRecord {
    IdentityRecord {
        id: IdentityId::parse(id).unwrap(),
        first_name: first.into(),
        last_name: last.into(),
        dob: NaiveDate::from_ymd_opt(dob.0, dob.1, dob.2).unwrap(),
    }
}

#[test]
fn form_insert_then_get() {
    let (_dir, env) = temp_env();
    let store = env.form_store();
    let id = SubmissionId::generate();

    assert!(!store.exists(&id).unwrap());
    store.insert_form(&document(id)).unwrap();

    assert!(store.exists(&id).unwrap());
    assert_eq!(store.get_form(&id).unwrap(), Some(document(id)));
    assert_eq!(store.form_count().unwrap(), 1);
}

#[test]
fn second_insert_of_same_id_is_duplicate() {
    let (_dir, env) = temp_env();
    let store = env.form_store();
    let id = SubmissionId::generate();

    store.insert_form(&document(id)).unwrap();
    let err = store.insert_form(&document(id)).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(key) if key == id.to_key()));
    assert_eq!(store.form_count().unwrap(), 1);
}

#[test]
fn concurrent_inserts_of_same_id_store_one_record() {
    let (_dir, env) = temp_env();
    let store = Arc::new(env.form_store());
    let id = SubmissionId::generate();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || store.insert_form(&document(id)).is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(store.form_count().unwrap(), 1);
}

#[test]
fn forms_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = SubmissionId::generate();
    {
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        env.form_store().insert_form(&document(id)).unwrap();
        env.sync().unwrap();
    }
    let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
    assert!(env.form_store().exists(&id).unwrap());
}

#[test]
fn identity_lookups() {
    let (_dir, env) = temp_env();
    let store = env.identity_store();
    let asha = record("dd0804db-35d4-4965-a7a2-ce6d3ffc2e7e", "Asha", "Karki", (1985, 4, 12));
    let bikash = record("0f3c8a4e-1b2d-4c5e-8f9a-0b1c2d3e4f5a", "Bikash", "Thapa", (1985, 4, 12));
    assert_eq!(store.import(&[asha.clone(), bikash.clone()]).unwrap(), 2);

    assert_eq!(store.get_identity(&asha.id).unwrap(), Some(asha.clone()));
    assert_eq!(
        store
            .get_identity(&IdentityId::parse("11111111-1111-4111-8111-111111111111").unwrap())
            .unwrap(),
        None
    );
    assert_eq!(store.find_by_name("Asha", "Karki").unwrap(), vec![asha.clone()]);
    assert!(store.find_by_name("Asha", "Thapa").unwrap().is_empty());

    let born = store
        .find_by_dob(NaiveDate::from_ymd_opt(1985, 4, 12).unwrap())
        .unwrap();
    assert_eq!(born.len(), 2);
}

#[test]
fn import_replaces_existing_record() {
    let (_dir, env) = temp_env();
    let store = env.identity_store();
    let id = "dd0804db-35d4-4965-a7a2-ce6d3ffc2e7e";
    store.import(&[record(id, "Asha", "Karki", (1985, 4, 12))]).unwrap();
    store.import(&[record(id, "Asha", "Shrestha", (1985, 4, 12))]).unwrap();

    let found = store.get_identity(&IdentityId::parse(id).unwrap()).unwrap().unwrap();
    assert_eq!(found.last_name, "Shrestha");
}
