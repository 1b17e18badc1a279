//! Draft, read and commit.

use std::sync::Arc;
use std::time::Duration;

use intake_queue::QueueProducer;
use intake_store::{FormStore, SessionStore, StoreError};
use intake_types::{Clock, DraftFields, FormDocument, Step, SubmissionId, SystemClock};
use intake_verification::TokenValidator;

use crate::payload::{DraftPayload, NormalizedDraft};
use crate::uploads::{Attachment, UploadRoot};
use crate::FormError;

pub struct FormWorkflow {
    sessions: Arc<dyn SessionStore>,
    forms: Arc<dyn FormStore>,
    tokens: Arc<TokenValidator>,
    uploads: UploadRoot,
    producer: Arc<QueueProducer>,
    clock: Arc<dyn Clock>,
    draft_ttl: Option<Duration>,
}

impl FormWorkflow {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        forms: Arc<dyn FormStore>,
        tokens: Arc<TokenValidator>,
        uploads: UploadRoot,
        producer: Arc<QueueProducer>,
    ) -> Self {
        Self {
            sessions,
            forms,
            tokens,
            uploads,
            producer,
            clock: Arc::new(SystemClock),
            draft_ttl: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Expire Draft entries after `ttl`. Without it they never expire.
    pub fn with_draft_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.draft_ttl = ttl;
        self
    }

    /// Stage a draft for a doctor who finished verification.
    ///
    /// Returns the fresh submission id, the handle for every later call.
    pub async fn draft(
        &self,
        token: &str,
        fields: DraftFields,
        attachments: Vec<Attachment>,
    ) -> Result<SubmissionId, FormError> {
        let identity = self.tokens.validate(token, Some(Step::Dob))?;

        let id = SubmissionId::generate();
        let files = self.uploads.save_all(&id, attachments).await?;
        let attachments = files.len();
        let payload = DraftPayload::new(&id, fields, files).encode()?;
        self.sessions.set(&id.to_key(), &payload, self.draft_ttl)?;

        tracing::info!(%identity, submission = %id, attachments, "form drafted");
        Ok(id)
    }

    /// Return the normalized draft without touching durable storage.
    pub fn read_draft(&self, id: &SubmissionId, token: &str) -> Result<NormalizedDraft, FormError> {
        self.load_checked(id, token)
    }

    /// Commit the draft to durable storage once, then publish it.
    ///
    /// The record stays committed even when publishing fails; the caller
    /// sees `QueueUnavailable` in that case.
    pub async fn commit(&self, id: &SubmissionId, token: &str) -> Result<FormDocument, FormError> {
        let draft = self.load_checked(id, token)?;
        let document = draft.to_document(self.clock.now())?;

        match self.forms.insert_form(&document) {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                tracing::warn!(submission = %id, "concurrent commit lost the insert");
                return Err(FormError::AlreadyCommitted);
            }
            Err(e) => {
                tracing::error!(submission = %id, "form insert failed: {e}");
                return Err(e.into());
            }
        }
        tracing::info!(submission = %id, "data registered");

        self.producer.publish(&draft).await.map_err(|e| {
            tracing::error!(submission = %id, "committed form not handed to queue: {e}");
            FormError::QueueUnavailable(e.to_string())
        })?;
        Ok(document)
    }

    /// Token check, draft lookup and duplicate check shared by read and commit.
    fn load_checked(&self, id: &SubmissionId, token: &str) -> Result<NormalizedDraft, FormError> {
        let identity = self.tokens.validate(token, None)?;

        let raw = self.sessions.get(&id.to_key())?.ok_or_else(|| {
            tracing::warn!(%identity, submission = %id, "draft not found");
            FormError::NotFound
        })?;
        if self.forms.exists(id)? {
            tracing::warn!(%identity, submission = %id, "form already committed");
            return Err(FormError::AlreadyCommitted);
        }

        let mut draft = DraftPayload::decode(&raw)?.normalize()?;
        // The entry key is authoritative for the id.
        draft.id = *id;
        Ok(draft)
    }
}
