// SPDX-License-Identifier: GPL-3.0-only

//! Payload resolution
//!
//! The same tag resolves differently depending on which dashboard flow
//! opened the scanner:
//!
//! | tag                | search / prescription     | verify / dispense                    |
//! |--------------------|---------------------------|--------------------------------------|
//! | `MEDICARD_PATIENT` | patient table by id       | first pending prescription for id    |
//! | `MEDICARD_RX`      | prescription table by id  | prescription table by id             |

use super::{DecodedPayload, PayloadTag, parse_payload};
use crate::constants::messages;
use crate::errors::ScanError;
use crate::records::{PatientRecord, PrescriptionRecord, RecordStores};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Which dashboard flow opened the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetContext {
    /// Doctor: search for a patient
    Search,
    /// Doctor: pick the patient for a new prescription
    Prescription,
    /// Pharmacist: verify a prescription
    Verify,
    /// Pharmacist: dispense medicines
    Dispense,
}

impl TargetContext {
    pub const ALL: [TargetContext; 4] = [
        TargetContext::Search,
        TargetContext::Prescription,
        TargetContext::Verify,
        TargetContext::Dispense,
    ];

    /// Flows that identify a patient
    pub fn is_patient_lookup(&self) -> bool {
        matches!(self, TargetContext::Search | TargetContext::Prescription)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetContext::Search => "search",
            TargetContext::Prescription => "prescription",
            TargetContext::Verify => "verify",
            TargetContext::Dispense => "dispense",
        }
    }

    /// Modal title when the caller does not supply one
    pub fn default_title(&self) -> &'static str {
        if self.is_patient_lookup() {
            messages::PATIENT_TITLE
        } else {
            messages::PRESCRIPTION_TITLE
        }
    }

    /// Modal subtitle when the caller does not supply one
    pub fn default_subtitle(&self) -> &'static str {
        if self.is_patient_lookup() {
            messages::PATIENT_SUBTITLE
        } else {
            messages::PRESCRIPTION_SUBTITLE
        }
    }

    fn invalid_message(&self) -> &'static str {
        if self.is_patient_lookup() {
            messages::INVALID_PATIENT_QR
        } else {
            messages::INVALID_MEDICARD_QR
        }
    }
}

impl std::fmt::Display for TargetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scan context '{0}' (expected search, prescription, verify or dispense)")]
pub struct UnknownContext(pub String);

impl std::str::FromStr for TargetContext {
    type Err = UnknownContext;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ctx| ctx.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownContext(s.to_string()))
    }
}

/// The record a scan resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedRecord {
    Patient(PatientRecord),
    Prescription(PrescriptionRecord),
}

impl ResolvedRecord {
    pub fn id(&self) -> &str {
        match self {
            ResolvedRecord::Patient(p) => &p.id,
            ResolvedRecord::Prescription(rx) => &rx.id,
        }
    }

    pub fn as_patient(&self) -> Option<&PatientRecord> {
        match self {
            ResolvedRecord::Patient(p) => Some(p),
            ResolvedRecord::Prescription(_) => None,
        }
    }

    pub fn as_prescription(&self) -> Option<&PrescriptionRecord> {
        match self {
            ResolvedRecord::Prescription(rx) => Some(rx),
            ResolvedRecord::Patient(_) => None,
        }
    }
}

/// Discriminant of [`ResolutionOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Resolved,
    NotFound,
    InvalidPayload,
    DecodeError,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutcomeKind::Resolved => "resolved",
            OutcomeKind::NotFound => "not_found",
            OutcomeKind::InvalidPayload => "invalid_payload",
            OutcomeKind::DecodeError => "decode_error",
        };
        f.write_str(s)
    }
}

/// Result of one scan, handed to the invoking flow
///
/// Every variant carries a display message; failures never escape as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved {
        record: ResolvedRecord,
        message: String,
    },
    NotFound {
        /// The scanned id that had no match
        id: String,
        message: String,
    },
    InvalidPayload {
        message: String,
    },
    DecodeError {
        message: String,
    },
}

impl ResolutionOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ResolutionOutcome::Resolved { .. } => OutcomeKind::Resolved,
            ResolutionOutcome::NotFound { .. } => OutcomeKind::NotFound,
            ResolutionOutcome::InvalidPayload { .. } => OutcomeKind::InvalidPayload,
            ResolutionOutcome::DecodeError { .. } => OutcomeKind::DecodeError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ResolutionOutcome::Resolved { message, .. }
            | ResolutionOutcome::NotFound { message, .. }
            | ResolutionOutcome::InvalidPayload { message }
            | ResolutionOutcome::DecodeError { message } => message,
        }
    }

    pub fn record(&self) -> Option<&ResolvedRecord> {
        match self {
            ResolutionOutcome::Resolved { record, .. } => Some(record),
            _ => None,
        }
    }

    /// The error this outcome stands for, if it is a failure
    pub fn error(&self) -> Option<ScanError> {
        match self {
            ResolutionOutcome::Resolved { .. } => None,
            ResolutionOutcome::NotFound { id, .. } => Some(ScanError::RecordNotFound(id.clone())),
            ResolutionOutcome::InvalidPayload { .. } => Some(ScanError::InvalidPayloadType),
            ResolutionOutcome::DecodeError { .. } => Some(ScanError::DecodeParseError),
        }
    }

    fn not_found(id: &str, message: String) -> Self {
        ResolutionOutcome::NotFound {
            id: id.to_string(),
            message,
        }
    }
}

/// Resolves decoded text against the record tables (read-only)
#[derive(Debug, Clone, Copy)]
pub struct PayloadRouter<'a> {
    stores: &'a RecordStores,
}

impl<'a> PayloadRouter<'a> {
    pub fn new(stores: &'a RecordStores) -> Self {
        Self { stores }
    }

    /// Parse and resolve decoded text for the given flow
    pub fn resolve(&self, text: &str, context: TargetContext) -> ResolutionOutcome {
        let outcome = match parse_payload(text) {
            Ok(payload) => self.resolve_payload(&payload, context),
            Err(ScanError::DecodeParseError) => ResolutionOutcome::DecodeError {
                message: messages::DECODE_ERROR.to_string(),
            },
            Err(_) => ResolutionOutcome::InvalidPayload {
                message: context.invalid_message().to_string(),
            },
        };

        info!(
            context = %context,
            kind = %outcome.kind(),
            record = ?outcome.record().map(ResolvedRecord::id),
            "Resolved scanned payload"
        );
        outcome
    }

    /// Resolve an already parsed payload
    pub fn resolve_payload(
        &self,
        payload: &DecodedPayload,
        context: TargetContext,
    ) -> ResolutionOutcome {
        debug!(tag = %payload.tag, id = %payload.id, context = %context, "Routing payload");

        match (payload.tag, context.is_patient_lookup()) {
            (PayloadTag::Prescription, _) => self.prescription_by_id(&payload.id),
            (PayloadTag::Patient, true) => self.patient_by_id(&payload.id),
            (PayloadTag::Patient, false) => self.pending_for_patient(&payload.id),
        }
    }

    fn patient_by_id(&self, id: &str) -> ResolutionOutcome {
        match self.stores.patients.get(id) {
            Some(patient) => ResolutionOutcome::Resolved {
                message: format!("Patient {} loaded.", patient.name),
                record: ResolvedRecord::Patient(patient.clone()),
            },
            None => ResolutionOutcome::not_found(id, format!("Patient ID \"{}\" not found.", id)),
        }
    }

    fn prescription_by_id(&self, id: &str) -> ResolutionOutcome {
        match self.stores.prescriptions.get(id) {
            Some(rx) => ResolutionOutcome::Resolved {
                message: format!("Prescription {} loaded.", rx.id),
                record: ResolvedRecord::Prescription(rx.clone()),
            },
            None => {
                ResolutionOutcome::not_found(id, format!("Prescription \"{}\" not found.", id))
            }
        }
    }

    // First pending in table order; see DESIGN.md for the open tie-break question
    fn pending_for_patient(&self, patient_id: &str) -> ResolutionOutcome {
        match self.stores.prescriptions.first_pending_for_patient(patient_id) {
            Some(rx) => ResolutionOutcome::Resolved {
                message: format!("Pending prescription {} loaded for {}.", rx.id, rx.patient.name),
                record: ResolvedRecord::Prescription(rx.clone()),
            },
            None => ResolutionOutcome::not_found(
                patient_id,
                messages::NO_PENDING_PRESCRIPTION.to_string(),
            ),
        }
    }
}

/// Title/subtitle pair shown by the scanner modal
///
/// A missing override takes the context default; a blank one gets the
/// generic modal text.
pub(crate) fn modal_text(
    context: TargetContext,
    title: Option<String>,
    subtitle: Option<String>,
) -> (String, String) {
    fn pick(given: Option<String>, context_default: &str, fallback: &str) -> String {
        match given {
            None => context_default.to_string(),
            Some(text) if text.trim().is_empty() => fallback.to_string(),
            Some(text) => text,
        }
    }

    (
        pick(title, context.default_title(), messages::DEFAULT_TITLE),
        pick(subtitle, context.default_subtitle(), messages::DEFAULT_SUBTITLE),
    )
}
