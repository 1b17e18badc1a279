//! LMDB implementation of FormStore.
//!
//! Forms are keyed by the canonical string form of their submission id and
//! stored as bincode. Inserts check for an existing key inside the same
//! write transaction; LMDB serializes writers, so two concurrent commits of
//! one submission id cannot both land.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use intake_store::{FormStore, StoreError};
use intake_types::{FormDocument, SubmissionId};

use crate::LmdbError;

pub struct LmdbFormStore {
    pub(crate) env: Arc<Env>,
    pub(crate) forms_db: Database<Bytes, Bytes>,
}

impl FormStore for LmdbFormStore {
    fn get_form(&self, id: &SubmissionId) -> Result<Option<FormDocument>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = id.to_key();
        let val = self
            .forms_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let doc: FormDocument = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    fn exists(&self, id: &SubmissionId) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = id.to_key();
        let found = self
            .forms_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn insert_form(&self, doc: &FormDocument) -> Result<(), StoreError> {
        let key = doc.id.to_key();
        let bytes = bincode::serialize(doc).map_err(LmdbError::from)?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let taken = self
            .forms_db
            .get(&wtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        if taken {
            // Dropping the txn aborts it.
            return Err(StoreError::Duplicate(key));
        }
        self.forms_db
            .put(&mut wtxn, key.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn form_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.forms_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
