//! Draft entry encoding and normalization.
//!
//! A Draft entry is JSON: the submitted fields under their form names, the
//! submission id under `__id`, `position` as the raw text the client sent,
//! and the saved attachment records. Normalizing renames `__id` to `id` and
//! parses `position` into structured JSON.

use chrono::{DateTime, Utc};
use intake_types::{AttachmentRecord, DraftFields, FileInfo, FormDocument, Position, SubmissionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FormError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPayload {
    #[serde(rename = "__id")]
    pub id: String,
    pub age_identity: String,
    pub accomp_ident: String,
    pub status_disease: String,
    pub status_condition: String,
    pub status_symptom: String,
    pub province: String,
    pub district: String,
    #[serde(default)]
    pub position: Option<Value>,
    #[serde(default)]
    pub files: Vec<AttachmentRecord>,
}

impl DraftPayload {
    pub fn new(id: &SubmissionId, fields: DraftFields, files: Vec<AttachmentRecord>) -> Self {
        Self {
            id: id.to_key(),
            age_identity: fields.age_identity,
            accomp_ident: fields.accomp_ident,
            status_disease: fields.status_disease,
            status_condition: fields.status_condition,
            status_symptom: fields.status_symptom,
            province: fields.province,
            district: fields.district,
            position: fields.position.map(Value::String),
            files,
        }
    }

    pub fn encode(&self) -> Result<String, FormError> {
        serde_json::to_string(self).map_err(|e| FormError::ValidationFailed(e.to_string()))
    }

    pub fn decode(raw: &str) -> Result<Self, FormError> {
        serde_json::from_str(raw)
            .map_err(|e| FormError::ValidationFailed(format!("malformed draft: {e}")))
    }

    pub fn normalize(self) -> Result<NormalizedDraft, FormError> {
        let id = SubmissionId::parse(&self.id)
            .map_err(|_| FormError::ValidationFailed("draft id is not a valid UUID".into()))?;
        let position = match self.position {
            Some(Value::String(raw)) => Some(serde_json::from_str(&raw).map_err(|_| {
                FormError::ValidationFailed(format!("position is not valid JSON: '{raw}'"))
            })?),
            other => other,
        };

        Ok(NormalizedDraft {
            id,
            age_identity: self.age_identity,
            accomp_ident: self.accomp_ident,
            status_disease: self.status_disease,
            status_condition: self.status_condition,
            status_symptom: self.status_symptom,
            province: self.province,
            district: self.district,
            position,
            files: self.files,
        })
    }
}

/// A draft as returned by ReadDraft and as published to the queue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDraft {
    pub id: SubmissionId,
    pub age_identity: String,
    pub accomp_ident: String,
    pub status_disease: String,
    pub status_condition: String,
    pub status_symptom: String,
    pub province: String,
    pub district: String,
    pub position: Option<Value>,
    pub files: Vec<AttachmentRecord>,
}

impl NormalizedDraft {
    /// Shape-check the draft into the durable document.
    pub fn to_document(&self, created_at: DateTime<Utc>) -> Result<FormDocument, FormError> {
        let position = match &self.position {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value::<Position>(value.clone()).map_err(
                |e| FormError::ValidationFailed(format!("invalid position: {e}")),
            )?),
        };
        let files = if self.files.is_empty() {
            None
        } else {
            Some(self.files.iter().map(FileInfo::from).collect())
        };

        Ok(FormDocument {
            id: self.id,
            accomp_ident: self.accomp_ident.clone(),
            age_identity: self.age_identity.clone(),
            district: self.district.clone(),
            files,
            position,
            province: self.province.clone(),
            status_condition: self.status_condition.clone(),
            status_disease: self.status_disease.clone(),
            status_symptom: self.status_symptom.clone(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fields(position: Option<&str>) -> DraftFields {
        DraftFields {
            age_identity: "30-40".into(),
            accomp_ident: "A-12".into(),
            status_disease: "dengue".into(),
            status_condition: "stable".into(),
            status_symptom: "fever".into(),
            province: "Bagmati".into(),
            district: "Kathmandu".into(),
            position: position.map(str::to_string),
        }
    }

    #[test]
    fn draft_entry_uses_form_field_names() {
        let id = SubmissionId::generate();
        let raw = DraftPayload::new(&id, fields(Some(r#"{"lat":1,"lng":2}"#)), vec![])
            .encode()
            .unwrap();
        let json: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["__id"], id.to_key());
        assert_eq!(json["ageIdentity"], "30-40");
        assert_eq!(json["statusSymptom"], "fever");
        assert!(json["position"].is_string());
    }

    #[test]
    fn normalize_parses_position_text() {
        let id = SubmissionId::generate();
        let draft = DraftPayload::new(&id, fields(Some(r#"{"lat":27.67,"lng":85.35}"#)), vec![])
            .normalize()
            .unwrap();
        assert_eq!(draft.id, id);
        assert_eq!(draft.position, Some(serde_json::json!({"lat": 27.67, "lng": 85.35})));

        let out = serde_json::to_value(&draft).unwrap();
        assert_eq!(out["id"], id.to_key());
        assert!(out.get("__id").is_none());
    }

    #[test]
    fn normalize_keeps_structured_position() {
        let mut payload = DraftPayload::new(&SubmissionId::generate(), fields(None), vec![]);
        payload.position = Some(serde_json::json!({"lat": 1.5, "lng": 2.5}));
        let draft = payload.normalize().unwrap();
        assert_eq!(draft.position.unwrap()["lng"], 2.5);
    }

    #[test]
    fn unparseable_position_fails_validation() {
        let payload = DraftPayload::new(&SubmissionId::generate(), fields(Some("27.6, 85.3")), vec![]);
        assert!(matches!(payload.normalize(), Err(FormError::ValidationFailed(_))));
    }

    #[test]
    fn document_rejects_non_numeric_coordinates() {
        let draft = DraftPayload::new(
            &SubmissionId::generate(),
            fields(Some(r#"{"lat":"north","lng":85.35}"#)),
            vec![],
        )
        .normalize()
        .unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert!(matches!(draft.to_document(at), Err(FormError::ValidationFailed(_))));
    }

    #[test]
    fn document_keeps_only_filenames() {
        let files = vec![AttachmentRecord {
            filename: "xray.png".into(),
            path: "uploaded_files/x_xray.png".into(),
            content_type: Some("image/png".into()),
        }];
        let draft = DraftPayload::new(&SubmissionId::generate(), fields(None), files)
            .normalize()
            .unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let doc = draft.to_document(at).unwrap();
        assert_eq!(doc.files.unwrap()[0].filename, "xray.png");
        assert_eq!(doc.position, None);
        assert_eq!(doc.created_at, at);
    }
}
