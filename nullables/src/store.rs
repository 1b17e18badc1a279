//! Nullable stores: thread-safe in-memory durable storage for testing.

use chrono::NaiveDate;
use intake_store::{FormStore, IdentityStore, StoreError};
use intake_types::{FormDocument, IdentityId, IdentityRecord, SubmissionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// An in-memory form store for testing.
///
/// `insert_form` refuses an existing id under one lock, like a backend with
/// a uniqueness constraint. `set_unavailable(true)` makes every call fail
/// the way an unreachable database would.
#[derive(Default)]
pub struct NullFormStore {
    forms: Mutex<HashMap<String, FormDocument>>,
    unavailable: AtomicBool,
    inserts: AtomicU32,
}

impl NullFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful inserts.
    pub fn insert_calls(&self) -> u32 {
        self.inserts.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Backend("form store unreachable".into()))
        } else {
            Ok(())
        }
    }
}

impl FormStore for NullFormStore {
    fn get_form(&self, id: &SubmissionId) -> Result<Option<FormDocument>, StoreError> {
        self.check_available()?;
        Ok(self.forms.lock().unwrap().get(&id.to_key()).cloned())
    }

    fn insert_form(&self, doc: &FormDocument) -> Result<(), StoreError> {
        self.check_available()?;
        let key = doc.id.to_key();
        let mut forms = self.forms.lock().unwrap();
        if forms.contains_key(&key) {
            return Err(StoreError::Duplicate(key));
        }
        forms.insert(key, doc.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn form_count(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.forms.lock().unwrap().len() as u64)
    }
}

/// An in-memory identity registry for testing.
#[derive(Default)]
pub struct NullIdentityStore {
    records: Mutex<Vec<IdentityRecord>>,
}

impl NullIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<IdentityRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn add(&self, record: IdentityRecord) {
        self.records.lock().unwrap().push(record);
    }
}

impl IdentityStore for NullIdentityStore {
    fn get_identity(&self, id: &IdentityId) -> Result<Option<IdentityRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == *id)
            .cloned())
    }

    fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<IdentityRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.has_name(first_name, last_name))
            .cloned()
            .collect())
    }

    fn find_by_dob(&self, dob: NaiveDate) -> Result<Vec<IdentityRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.dob == dob)
            .cloned()
            .collect())
    }
}
