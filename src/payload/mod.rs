// SPDX-License-Identifier: GPL-3.0-only

//! MediCard QR payloads
//!
//! A scanned code carries a flat JSON object:
//!
//! ```text
//! { "type": "MEDICARD_PATIENT" | "MEDICARD_RX", "id": "<string>", "name"?: "<string>" }
//! ```
//!
//! [`parse_payload`] turns decoded text into a [`DecodedPayload`];
//! [`PayloadRouter`] resolves it against the record tables.

mod router;

pub use router::{
    OutcomeKind, PayloadRouter, ResolutionOutcome, ResolvedRecord, TargetContext, UnknownContext,
};
pub(crate) use router::modal_text;

use crate::errors::ScanError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `type` tag distinguishing patient codes from prescription codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadTag {
    #[serde(rename = "MEDICARD_PATIENT")]
    Patient,
    #[serde(rename = "MEDICARD_RX")]
    Prescription,
}

impl PayloadTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadTag::Patient => "MEDICARD_PATIENT",
            PayloadTag::Prescription => "MEDICARD_RX",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "MEDICARD_PATIENT" => Some(PayloadTag::Patient),
            "MEDICARD_RX" => Some(PayloadTag::Prescription),
            _ => None,
        }
    }
}

impl std::fmt::Display for PayloadTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed content of a scanned code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedPayload {
    #[serde(rename = "type")]
    pub tag: PayloadTag,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DecodedPayload {
    /// Payload for a patient's MediCard
    pub fn patient(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            tag: PayloadTag::Patient,
            id: id.into(),
            name,
        }
    }

    /// Payload for a prescription slip
    pub fn prescription(id: impl Into<String>) -> Self {
        Self {
            tag: PayloadTag::Prescription,
            id: id.into(),
            name: None,
        }
    }

    /// The JSON text to embed in a QR code
    pub fn to_wire(&self) -> String {
        // Two string fields and an optional third cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Parse decoded QR text
///
/// * not JSON at all → [`ScanError::DecodeParseError`]
/// * JSON without a known `type`, or without a non-empty string `id`
///   → [`ScanError::InvalidPayloadType`]
pub fn parse_payload(text: &str) -> Result<DecodedPayload, ScanError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ScanError::DecodeParseError)?;

    let Value::Object(fields) = value else {
        return Err(ScanError::InvalidPayloadType);
    };

    let tag = fields
        .get("type")
        .and_then(Value::as_str)
        .and_then(PayloadTag::from_tag)
        .ok_or(ScanError::InvalidPayloadType)?;

    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(ScanError::InvalidPayloadType)?;

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(DecodedPayload {
        tag,
        id: id.to_string(),
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patient_payload() {
        let payload =
            parse_payload(r#"{"type":"MEDICARD_PATIENT","id":"MED-2024-04821","name":"Arjun Sharma"}"#)
                .unwrap();
        assert_eq!(payload.tag, PayloadTag::Patient);
        assert_eq!(payload.id, "MED-2024-04821");
        assert_eq!(payload.name.as_deref(), Some("Arjun Sharma"));
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let payload = parse_payload(r#"{"type":"MEDICARD_RX","id":"RX-8821","issued":"2025-02-12"}"#)
            .unwrap();
        assert_eq!(payload, DecodedPayload::prescription("RX-8821"));
    }

    #[test]
    fn test_non_json_is_decode_error() {
        assert_eq!(parse_payload("not json at all"), Err(ScanError::DecodeParseError));
        assert_eq!(parse_payload(""), Err(ScanError::DecodeParseError));
        assert_eq!(parse_payload("{\"type\":"), Err(ScanError::DecodeParseError));
    }

    #[test]
    fn test_json_without_valid_tag_is_invalid() {
        for text in [
            r#"{"id":"MED-1"}"#,
            r#"{"type":"WIFI","id":"MED-1"}"#,
            r#"{"type":"medicard_patient","id":"MED-1"}"#,
            r#"{"type":42,"id":"MED-1"}"#,
            r#"["MEDICARD_PATIENT","MED-1"]"#,
            r#""MEDICARD_PATIENT""#,
            "42",
        ] {
            assert_eq!(parse_payload(text), Err(ScanError::InvalidPayloadType), "{}", text);
        }
    }

    #[test]
    fn test_missing_or_empty_id_is_invalid() {
        assert_eq!(
            parse_payload(r#"{"type":"MEDICARD_PATIENT"}"#),
            Err(ScanError::InvalidPayloadType)
        );
        assert_eq!(
            parse_payload(r#"{"type":"MEDICARD_RX","id":""}"#),
            Err(ScanError::InvalidPayloadType)
        );
        assert_eq!(
            parse_payload(r#"{"type":"MEDICARD_RX","id":8821}"#),
            Err(ScanError::InvalidPayloadType)
        );
    }

    #[test]
    fn test_wire_format_parses_back() {
        let payload = DecodedPayload::patient("MED-2024-07334", Some("Sneha Patel".into()));
        let wire = payload.to_wire();
        assert!(wire.contains(r#""type":"MEDICARD_PATIENT""#));
        assert_eq!(parse_payload(&wire).unwrap(), payload);

        let rx = DecodedPayload::prescription("RX-7734").to_wire();
        assert_eq!(rx, r#"{"type":"MEDICARD_RX","id":"RX-7734"}"#);
    }
}
