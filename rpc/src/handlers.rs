//! RPC request handlers.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use intake_forms::{Attachment, NormalizedDraft};
use intake_types::{DraftFields, SubmissionId};
use intake_verification::{parse_dob, IssuedToken, StepOutcome, VerificationError};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::extract::JsonBody;
use crate::spans::operation_span;
use crate::{Envelope, RpcError, RpcState};

type RpcResult<T> = Result<Json<Envelope<T>>, RpcError>;

// ── Verification ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyIdentityRequest {
    pub doctor_id: String,
}

#[derive(Deserialize)]
pub struct VerifyUsernameRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize)]
pub struct VerifyDobRequest {
    pub dob: String,
}

pub async fn verify_identity(
    State(state): State<Arc<RpcState>>,
    JsonBody(req): JsonBody<VerifyIdentityRequest>,
) -> RpcResult<IssuedToken> {
    let machine = state.verification.clone();
    let outcome = off_runtime("verify_identity", move || {
        machine.verify_identity(&req.doctor_id)
    })
    .await?;
    step_response(outcome)
}

pub async fn verify_username(
    State(state): State<Arc<RpcState>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<VerifyUsernameRequest>,
) -> RpcResult<IssuedToken> {
    let token = authorization(&headers)?;
    let machine = state.verification.clone();
    let outcome = off_runtime("verify_username", move || {
        machine.verify_username(&token, &req.first_name, &req.last_name)
    })
    .await?;
    step_response(outcome)
}

pub async fn verify_dob(
    State(state): State<Arc<RpcState>>,
    headers: HeaderMap,
    JsonBody(req): JsonBody<VerifyDobRequest>,
) -> RpcResult<IssuedToken> {
    // A bad date is reported ahead of a missing header.
    parse_dob(&req.dob)?;
    let token = authorization(&headers)?;
    let machine = state.verification.clone();
    let outcome = off_runtime("verify_dob", move || machine.verify_dob(&token, &req.dob)).await?;
    step_response(outcome)
}

/// Run a verification step on the blocking pool; identity lookups scan the
/// registry synchronously.
async fn off_runtime<F>(operation: &'static str, step: F) -> Result<StepOutcome, RpcError>
where
    F: FnOnce() -> Result<StepOutcome, VerificationError> + Send + 'static,
{
    let span = operation_span(operation);
    tokio::task::spawn_blocking(move || span.in_scope(step))
        .await
        .map_err(|e| RpcError::Server(format!("{operation}: {e}")))?
        .map_err(RpcError::from)
}

fn step_response(outcome: StepOutcome) -> RpcResult<IssuedToken> {
    Ok(Json(match outcome {
        StepOutcome::Advanced { token, message } => Envelope::ok(message, token),
        StepOutcome::Rejected { message } => Envelope {
            success: false,
            message,
            body: None,
        },
    }))
}

// ── Forms ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct DraftCreated {
    pub form_id: SubmissionId,
}

pub async fn draft_form(
    State(state): State<Arc<RpcState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> RpcResult<DraftCreated> {
    let token = authorization(&headers)?;
    let (fields, attachments) = read_form(multipart).await?;
    let form_id = state
        .forms
        .draft(&token, fields, attachments)
        .instrument(operation_span("draft_form"))
        .await?;
    Ok(Json(Envelope::ok("Form drafted.", DraftCreated { form_id })))
}

pub async fn read_draft(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> RpcResult<NormalizedDraft> {
    let _span = operation_span("read_draft").entered();
    let token = authorization(&headers)?;
    let id = submission_id(&id)?;
    let draft = state.forms.read_draft(&id, &token)?;
    Ok(Json(Envelope::ok("Form created.", draft)))
}

pub async fn commit_form(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Envelope<()>>, RpcError> {
    let token = authorization(&headers)?;
    let id = submission_id(&id)?;
    state
        .forms
        .commit(&id, &token)
        .instrument(operation_span("commit_form"))
        .await?;
    Ok(Json(Envelope::done("Data registered.")))
}

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<Arc<RpcState>>) -> Json<Envelope<HealthResponse>> {
    Json(Envelope::ok(
        "ok",
        HealthResponse {
            uptime_secs: state.started_at.elapsed().as_secs(),
        },
    ))
}

pub async fn metrics(State(state): State<Arc<RpcState>>) -> Result<impl IntoResponse, RpcError> {
    let (body, content_type) = state.metrics.encode()?;
    Ok(([(header::CONTENT_TYPE, content_type)], body))
}

// ── Extraction helpers ───────────────────────────────────────────────────

fn authorization(headers: &HeaderMap) -> Result<String, RpcError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(RpcError::MissingAuthorization)
}

fn submission_id(raw: &str) -> Result<SubmissionId, RpcError> {
    SubmissionId::parse(raw).map_err(|_| RpcError::InvalidPathId)
}

/// Collect the draft fields and uploaded files from a multipart body.
async fn read_form(mut multipart: Multipart) -> Result<(DraftFields, Vec<Attachment>), RpcError> {
    let mut fields = DraftFields::default();
    let mut seen = Vec::new();
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RpcError::BadMultipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "files" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| RpcError::BadMultipart(e.to_string()))?;
            attachments.push(Attachment {
                filename,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| RpcError::BadMultipart(e.to_string()))?;
        match name.as_str() {
            "age_identity" => fields.age_identity = value,
            "accomp_ident" => fields.accomp_ident = value,
            "status_disease" => fields.status_disease = value,
            "status_condition" => fields.status_condition = value,
            "status_symptom" => fields.status_symptom = value,
            "province" => fields.province = value,
            "district" => fields.district = value,
            "position" => fields.position = Some(value),
            other => {
                tracing::debug!(field = other, "ignoring unknown form field");
                continue;
            }
        }
        seen.push(name);
    }

    for required in REQUIRED_FIELDS {
        if !seen.iter().any(|s| s == required) {
            return Err(RpcError::BadMultipart(format!("missing field '{required}'")));
        }
    }
    Ok((fields, attachments))
}

const REQUIRED_FIELDS: [&str; 8] = [
    "age_identity",
    "accomp_ident",
    "status_disease",
    "status_condition",
    "status_symptom",
    "province",
    "district",
    "position",
];
