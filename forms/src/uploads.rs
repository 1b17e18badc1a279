//! Attachment persistence under a fixed upload root.

use std::collections::HashSet;
use std::path::{Component, Path};

use futures_util::future::try_join_all;
use intake_types::{AttachmentRecord, SubmissionId};
use strict_path::PathBoundary;

use crate::FormError;

/// An uploaded file as received from the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// The directory attachments are written to. Every path is joined through a
/// [`PathBoundary`], so nothing is written outside it.
#[derive(Clone)]
pub struct UploadRoot {
    boundary: PathBoundary<()>,
}

impl UploadRoot {
    /// Open the root, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FormError> {
        let boundary = PathBoundary::<()>::try_new_create(dir.as_ref())
            .map_err(|e| FormError::AttachmentWrite(e.to_string()))?;
        Ok(Self { boundary })
    }

    pub fn display(&self) -> String {
        self.boundary.strictpath_display().to_string()
    }

    /// Write every attachment as `{id}_{filename}`, concurrently.
    ///
    /// Attachments without a filename are skipped. A filename that is not a
    /// single plain path component, or that repeats within the submission,
    /// is rejected before anything is written.
    pub async fn save_all(
        &self,
        id: &SubmissionId,
        attachments: Vec<Attachment>,
    ) -> Result<Vec<AttachmentRecord>, FormError> {
        let mut pending = Vec::with_capacity(attachments.len());
        let mut seen = HashSet::new();
        for attachment in attachments {
            if attachment.filename.is_empty() {
                continue;
            }
            if !is_plain_filename(&attachment.filename) {
                return Err(FormError::ValidationFailed(format!(
                    "invalid attachment filename '{}'",
                    attachment.filename
                )));
            }
            if !seen.insert(attachment.filename.clone()) {
                return Err(FormError::ValidationFailed(format!(
                    "duplicate attachment filename '{}'",
                    attachment.filename
                )));
            }
            let target = self
                .boundary
                .strict_join(format!("{}_{}", id.to_key(), attachment.filename))
                .map_err(|e| FormError::ValidationFailed(e.to_string()))?;
            pending.push((target, attachment));
        }

        let writes = pending.into_iter().map(|(target, attachment)| async move {
            let path = target.strictpath_to_string_lossy().into_owned();
            let Attachment {
                filename,
                content_type,
                bytes,
            } = attachment;
            let written = path.clone();
            tokio::task::spawn_blocking(move || target.write(&bytes))
                .await
                .map_err(|e| FormError::AttachmentWrite(e.to_string()))?
                .map_err(|e| FormError::AttachmentWrite(format!("{written}: {e}")))?;
            tracing::debug!(%path, "attachment saved");
            Ok::<_, FormError>(AttachmentRecord {
                filename,
                path,
                content_type,
            })
        });

        try_join_all(writes).await
    }
}

fn is_plain_filename(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
