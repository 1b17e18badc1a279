//! LMDB implementation of IdentityStore.
//!
//! The registry is small and read-mostly, so name and date-of-birth lookups
//! are full scans rather than secondary indexes.

use std::sync::Arc;

use chrono::NaiveDate;
use heed::types::Bytes;
use heed::{Database, Env};

use intake_store::{IdentityStore, StoreError};
use intake_types::{IdentityId, IdentityRecord};

use crate::LmdbError;

pub struct LmdbIdentityStore {
    pub(crate) env: Arc<Env>,
    pub(crate) identities_db: Database<Bytes, Bytes>,
}

impl LmdbIdentityStore {
    /// Load records exported from the system of record, replacing any
    /// existing record with the same id. Returns the number written.
    pub fn import(&self, records: &[IdentityRecord]) -> Result<usize, LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        for record in records {
            let bytes = bincode::serialize(record)?;
            self.identities_db
                .put(&mut wtxn, record.id.to_key().as_bytes(), &bytes)?;
        }
        wtxn.commit()?;
        tracing::info!(count = records.len(), "imported identity records");
        Ok(records.len())
    }

    fn scan<F>(&self, mut keep: F) -> Result<Vec<IdentityRecord>, LmdbError>
    where
        F: FnMut(&IdentityRecord) -> bool,
    {
        let rtxn = self.env.read_txn()?;
        let mut result = Vec::new();
        for entry in self.identities_db.iter(&rtxn)? {
            let (_, val) = entry?;
            let record: IdentityRecord = bincode::deserialize(val)?;
            if keep(&record) {
                result.push(record);
            }
        }
        Ok(result)
    }
}

impl IdentityStore for LmdbIdentityStore {
    fn get_identity(&self, id: &IdentityId) -> Result<Option<IdentityRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = id.to_key();
        match self
            .identities_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(
                bincode::deserialize(bytes).map_err(LmdbError::from)?,
            )),
            None => Ok(None),
        }
    }

    fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<IdentityRecord>, StoreError> {
        Ok(self.scan(|r| r.has_name(first_name, last_name))?)
    }

    fn find_by_dob(&self, dob: NaiveDate) -> Result<Vec<IdentityRecord>, StoreError> {
        Ok(self.scan(|r| r.dob == dob)?)
    }
}
