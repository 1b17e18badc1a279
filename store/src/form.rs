//! Durable form storage trait.

use intake_types::{FormDocument, SubmissionId};

use crate::StoreError;

pub trait FormStore: Send + Sync {
    /// Look up a committed form by its submission id.
    fn get_form(&self, id: &SubmissionId) -> Result<Option<FormDocument>, StoreError>;

    fn exists(&self, id: &SubmissionId) -> Result<bool, StoreError> {
        self.get_form(id).map(|doc| doc.is_some())
    }

    /// Insert a committed form. Backends that can do so atomically must
    /// refuse an existing id with [`StoreError::Duplicate`].
    fn insert_form(&self, doc: &FormDocument) -> Result<(), StoreError>;

    fn form_count(&self) -> Result<u64, StoreError>;
}
