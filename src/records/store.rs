// SPDX-License-Identifier: GPL-3.0-only

//! Typed record tables
//!
//! Tables keep insertion order: the pending-prescription search returns the
//! first match in that order.

use super::{PatientRecord, PrescriptionRecord};
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

const DEMO_RECORDS: &str = include_str!("../../data/demo_records.json");

/// Records addressable by a string id
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Insertion-ordered mapping from id to record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTable<R> {
    records: Vec<R>,
    index: HashMap<String, usize>,
}

impl<R> Default for RecordTable<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R: Keyed> RecordTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record; a replaced record keeps its position
    pub fn insert(&mut self, record: R) -> Option<R> {
        match self.index.get(record.key()) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index
                    .insert(record.key().to_string(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut R> {
        self.index.get(id).map(|&pos| &mut self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn from_records(records: Vec<R>, table: &str) -> AppResult<Self> {
        let mut out = Self::new();
        for record in records {
            let id = record.key().to_string();
            if out.insert(record).is_some() {
                return Err(AppError::Records(format!(
                    "duplicate id \"{}\" in {} table",
                    id, table
                )));
            }
        }
        Ok(out)
    }
}

pub type PatientStore = RecordTable<PatientRecord>;
pub type PrescriptionStore = RecordTable<PrescriptionRecord>;

impl PrescriptionStore {
    /// First pending prescription for a patient, in table order
    ///
    /// With several pending prescriptions this is simply the earliest
    /// inserted one; no business priority is implied.
    pub fn first_pending_for_patient(&self, patient_id: &str) -> Option<&PrescriptionRecord> {
        self.iter()
            .find(|rx| rx.patient.id == patient_id && rx.is_pending())
    }
}

/// Both tables the scanner resolves against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStores {
    pub patients: PatientStore,
    pub prescriptions: PrescriptionStore,
}

/// Tables shared between the dashboards (writers) and the scanner (reader)
pub type SharedRecords = Arc<RwLock<RecordStores>>;

#[derive(Deserialize)]
struct RecordFile {
    #[serde(default)]
    patients: Vec<PatientRecord>,
    #[serde(default)]
    prescriptions: Vec<PrescriptionRecord>,
}

impl RecordStores {
    /// Parse tables from JSON (`{"patients": [...], "prescriptions": [...]}`)
    pub fn from_json(text: &str) -> AppResult<Self> {
        let file: RecordFile =
            serde_json::from_str(text).map_err(|e| AppError::Records(e.to_string()))?;
        Ok(Self {
            patients: RecordTable::from_records(file.patients, "patients")?,
            prescriptions: RecordTable::from_records(file.prescriptions, "prescriptions")?,
        })
    }

    /// The bundled demo tables
    pub fn demo() -> AppResult<Self> {
        Self::from_json(DEMO_RECORDS)
    }

    /// Load tables from a JSON file
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let stores = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            patients = stores.patients.len(),
            prescriptions = stores.prescriptions.len(),
            "Loaded record tables"
        );
        Ok(stores)
    }

    /// Wrap for sharing with a scanner
    pub fn into_shared(self) -> SharedRecords {
        Arc::new(RwLock::new(self))
    }
}
