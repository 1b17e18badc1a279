//! Form data: the fields a doctor drafts and the document that gets committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SubmissionId;

/// Field values as submitted when drafting a form.
///
/// Everything arrives as text; `position` is the raw JSON text the client
/// sent (e.g. `{"lat":27.67,"lng":85.35}`) and is only parsed on finalize.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftFields {
    pub age_identity: String,
    pub accomp_ident: String,
    pub status_disease: String,
    pub status_condition: String,
    pub status_symptom: String,
    pub province: String,
    pub district: String,
    pub position: Option<String>,
}

/// An attachment saved to disk at draft time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub filename: String,
    pub path: String,
    pub content_type: Option<String>,
}

/// Geographic position of the patient.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// Attachment descriptor as kept in durable storage. The saved path and
/// content type stay workflow-internal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
}

impl From<&AttachmentRecord> for FileInfo {
    fn from(record: &AttachmentRecord) -> Self {
        Self {
            filename: record.filename.clone(),
        }
    }
}

/// The finalized, durable record of a submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDocument {
    pub id: SubmissionId,
    pub accomp_ident: String,
    pub age_identity: String,
    pub district: String,
    pub files: Option<Vec<FileInfo>>,
    pub position: Option<Position>,
    pub province: String,
    pub status_condition: String,
    pub status_disease: String,
    pub status_symptom: String,
    /// Assigned at commit time.
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
}
