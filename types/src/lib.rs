//! Fundamental types for the clinical intake backend.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! identity and submission ids, verification steps, form drafts and committed
//! form documents, and the clock abstraction.

pub mod error;
pub mod form;
pub mod identity;
pub mod step;
pub mod submission;
pub mod time;

pub use error::TypesError;
pub use form::{AttachmentRecord, DraftFields, FileInfo, FormDocument, Position};
pub use identity::{IdentityId, IdentityRecord};
pub use step::Step;
pub use submission::SubmissionId;
pub use time::{Clock, SystemClock};
