//! OCR collaborator: prescription image extraction over HTTP.
//!
//! The endpoint accepts `{"image": <base64>}` and answers with the parsed
//! prescription, or `{"error": ...}` when the image could not be read. Callers are
//! expected to fall back to [`entry::manual_entry`] on any [`ExtractionError`].

pub mod entry;

use std::time::Duration;

use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::OcrConfig;
use crate::schedule::types::{Medicine, PatientRecord, RecordStatus};

pub const UNKNOWN_HOSPITAL: &str = "Unknown Hospital";
pub const DEFAULT_DIAGNOSIS: &str = "General Consultation";

/// Structured result of reading a prescription, from OCR or manual entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPrescription {
    #[serde(default)]
    pub hospital_name: String,
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub risk_flags: Vec<String>,
}

impl ParsedPrescription {
    /// Turn reviewed data into a record ready to save, filling the defaults a new
    /// record gets: fresh id, fallback hospital name, generic diagnosis, `today` as
    /// the date added, and an ongoing status.
    pub fn into_record(self, today: NaiveDate) -> PatientRecord {
        let hospital_name = match self.hospital_name.trim() {
            "" => UNKNOWN_HOSPITAL.to_string(),
            name => name.to_string(),
        };
        PatientRecord {
            id: uuid::Uuid::now_v7().to_string(),
            hospital_name,
            diagnosis: DEFAULT_DIAGNOSIS.to_string(),
            date_added: today.format("%Y-%m-%d").to_string(),
            medicines: self.medicines,
            status: RecordStatus::OngoingTreatment,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no extraction endpoint configured")]
    NotConfigured,
    #[error("image is empty")]
    EmptyImage,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("extraction service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("extraction service could not read the image: {0}")]
    Service(String),
    #[error("unexpected extraction response: {0}")]
    Malformed(String),
}

/// HTTP client for the extraction endpoint.
#[derive(Debug, Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl OcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self, ExtractionError> {
        let endpoint = config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ExtractionError::NotConfigured);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_key = Some(config.api_key.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    /// Send raw image bytes for extraction.
    pub async fn extract(&self, image: &[u8]) -> Result<ParsedPrescription, ExtractionError> {
        if image.is_empty() {
            return Err(ExtractionError::EmptyImage);
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        tracing::info!(bytes = image.len(), endpoint = %self.endpoint, "sending prescription image");

        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "image": encoded }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or(body),
            });
        }

        let parsed = parse_response(&body)?;
        tracing::info!(
            hospital = %parsed.hospital_name,
            medicines = parsed.medicines.len(),
            confidence = parsed.confidence_score,
            risk_flags = parsed.risk_flags.len(),
            "prescription extracted"
        );
        Ok(parsed)
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}

fn parse_response(body: &str) -> Result<ParsedPrescription, ExtractionError> {
    if let Some(message) = error_message(body) {
        return Err(ExtractionError::Service(message));
    }
    serde_json::from_str(body).map_err(|e| ExtractionError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_service_payload() {
        let body = r#"{
            "hospital_name": "Apollo Specialty Clinic",
            "medicines": [
                {"med_name": "Augmentin 625 Duo", "dose": "625mg", "frequency": "1-0-1", "duration": "5 days", "instructions": "After food"}
            ],
            "confidence_score": 0.98,
            "risk_flags": []
        }"#;
        let parsed = parse_response(body).unwrap();
        assert_eq!(parsed.hospital_name, "Apollo Specialty Clinic");
        assert_eq!(parsed.medicines[0].name, "Augmentin 625 Duo");
        assert_eq!(parsed.medicines[0].instructions.as_deref(), Some("After food"));
    }

    #[test]
    fn error_body_is_a_service_failure() {
        let err = parse_response(r#"{"error": "Image data missing"}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::Service(m) if m == "Image data missing"));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse_response("not json"), Err(ExtractionError::Malformed(_))));
    }

    #[test]
    fn blank_endpoint_is_not_configured() {
        let config = OcrConfig::default();
        assert!(matches!(OcrClient::new(&config), Err(ExtractionError::NotConfigured)));
    }

    #[test]
    fn record_defaults_fill_blanks() {
        let parsed = ParsedPrescription {
            hospital_name: "  ".into(),
            medicines: vec![],
            confidence_score: 0.4,
            risk_flags: vec!["illegible dose".into()],
        };
        let record = parsed.into_record(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(record.hospital_name, UNKNOWN_HOSPITAL);
        assert_eq!(record.diagnosis, DEFAULT_DIAGNOSIS);
        assert_eq!(record.date_added, "2024-03-09");
        assert_eq!(record.status, RecordStatus::OngoingTreatment);
        assert!(!record.id.is_empty());
    }
}
