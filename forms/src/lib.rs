//! Form draft/commit workflow.
//!
//! A verified doctor drafts a form (fields plus attachments) into the
//! Session Store under a fresh submission id, may read the draft back, and
//! finally commits it exactly once to durable storage, after which the
//! draft is handed to the summary worker through the queue producer.

pub mod error;
pub mod payload;
pub mod uploads;
pub mod workflow;

pub use error::FormError;
pub use payload::{DraftPayload, NormalizedDraft};
pub use uploads::{Attachment, UploadRoot};
pub use workflow::FormWorkflow;
