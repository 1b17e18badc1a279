//! Identity record source.
//!
//! Read-only view of the doctor registry; the records are owned by a
//! separate system of record.

use chrono::NaiveDate;
use intake_types::{IdentityId, IdentityRecord};

use crate::StoreError;

pub trait IdentityStore: Send + Sync {
    fn get_identity(&self, id: &IdentityId) -> Result<Option<IdentityRecord>, StoreError>;

    /// All records whose first and last name match exactly.
    fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<IdentityRecord>, StoreError>;

    /// All records born on `dob`.
    fn find_by_dob(&self, dob: NaiveDate) -> Result<Vec<IdentityRecord>, StoreError>;
}
