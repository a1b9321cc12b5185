// SPDX-License-Identifier: GPL-3.0-only

//! Patient and prescription records
//!
//! The dashboards own these tables and mutate them; the scanner only reads
//! them through [`RecordStores`].

mod store;

pub use store::{Keyed, PatientStore, PrescriptionStore, RecordStores, RecordTable, SharedRecords};

use serde::{Deserialize, Serialize};

/// A patient's medical profile, keyed by MediCard id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub blood: String,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    pub allergies: String,
    #[serde(default)]
    pub last_visit: Option<String>,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub prescriptions: Vec<PrescriptionSummary>,
}

/// Lab or diagnostic report attached to a patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

/// Prescription as listed on the patient profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionSummary {
    pub id: String,
    pub date: String,
    pub diagnosis: String,
    pub medicines: Vec<String>,
}

/// Dispensing state of a prescription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrescriptionStatus {
    Pending,
    Dispensed,
}

impl std::fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrescriptionStatus::Pending => write!(f, "Pending"),
            PrescriptionStatus::Dispensed => write!(f, "Dispensed"),
        }
    }
}

/// Full prescription as seen by the pharmacist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub id: String,
    pub date: String,
    pub diagnosis: String,
    pub status: PrescriptionStatus,
    pub doctor: DoctorRef,
    pub patient: PatientRef,
    pub medicines: Vec<MedicineLine>,
}

impl PrescriptionRecord {
    pub fn is_pending(&self) -> bool {
        self.status == PrescriptionStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorRef {
    pub name: String,
    pub id: String,
    pub hospital: String,
    pub specialisation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRef {
    pub name: String,
    pub id: String,
    pub age: u32,
    pub blood: String,
    pub allergies: String,
}

/// One medicine on a prescription and whether it has been handed out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineLine {
    pub name: String,
    pub dose: String,
    pub duration: String,
    pub dispensed: bool,
}

impl Keyed for PatientRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for PrescriptionRecord {
    fn key(&self) -> &str {
        &self.id
    }
}
