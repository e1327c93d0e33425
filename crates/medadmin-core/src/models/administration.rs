//! Administration models: stored records, caller input, and resolved views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Medication, Patient};

/// Version assigned to a freshly inserted administration.
pub const INITIAL_VERSION: i64 = 1;

/// A stored administration record: one dose of one medication given to one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Administration {
    /// Store-assigned identity, never reused
    pub id: i64,
    /// Patient foreign key
    pub patient_id: i64,
    /// Medication foreign key
    pub medication_id: i64,
    /// Dose given
    pub dose: f64,
    /// When the dose was given
    pub time_given: DateTime<Utc>,
    /// Optimistic concurrency token, advanced on every successful update
    pub version: i64,
}

/// Which foreign key failed to resolve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReferenceField {
    Patient,
    Medication,
}

impl ReferenceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceField::Patient => "patient_id",
            ReferenceField::Medication => "medication_id",
        }
    }
}

impl std::fmt::Display for ReferenceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("dose must be a finite number, got {0}")]
    NonFiniteDose(f64),

    #[error("dose must not be negative, got {0}")]
    NegativeDose(f64),

    #[error("time_given is required")]
    MissingTimeGiven,
}

/// Administration fields as supplied by a caller, before validation.
///
/// `id` is the identity carried in the request body; on update it must match
/// the identity of the record being replaced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdministrationRequest {
    pub id: Option<i64>,
    pub patient_id: i64,
    pub medication_id: i64,
    pub dose: f64,
    pub time_given: Option<DateTime<Utc>>,
}

impl AdministrationRequest {
    /// Create a request for a new administration.
    pub fn new(patient_id: i64, medication_id: i64, dose: f64, time_given: DateTime<Utc>) -> Self {
        Self {
            id: None,
            patient_id,
            medication_id,
            dose,
            time_given: Some(time_given),
        }
    }

    /// Set the body identity (used by update).
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Check dose and timestamp, producing the fields the store persists.
    pub fn validate(&self) -> Result<ValidAdministration, ValidationError> {
        if !self.dose.is_finite() {
            return Err(ValidationError::NonFiniteDose(self.dose));
        }
        if self.dose < 0.0 {
            return Err(ValidationError::NegativeDose(self.dose));
        }
        let time_given = self.time_given.ok_or(ValidationError::MissingTimeGiven)?;

        Ok(ValidAdministration {
            patient_id: self.patient_id,
            medication_id: self.medication_id,
            dose: self.dose,
            time_given,
        })
    }
}

/// The four mutable administration fields after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAdministration {
    pub patient_id: i64,
    pub medication_id: i64,
    pub dose: f64,
    pub time_given: DateTime<Utc>,
}

/// Patient fields embedded in a resolved view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientRef {
    pub id: i64,
    pub given_name: String,
    pub family_name: String,
}

impl From<Patient> for PatientRef {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            given_name: patient.given_name,
            family_name: patient.family_name,
        }
    }
}

/// Medication fields embedded in a resolved view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationRef {
    pub id: i64,
    pub name: String,
}

impl From<Medication> for MedicationRef {
    fn from(medication: Medication) -> Self {
        Self {
            id: medication.id,
            name: medication.name,
        }
    }
}

/// An administration joined with the patient and medication it references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdministrationView {
    pub id: i64,
    pub version: i64,
    pub dose: f64,
    pub time_given: DateTime<Utc>,
    pub patient: PatientRef,
    pub medication: MedicationRef,
}

impl AdministrationView {
    /// Compose a view. Callers are responsible for passing the records the
    /// administration actually references.
    pub fn new(administration: Administration, patient: Patient, medication: Medication) -> Self {
        Self {
            id: administration.id,
            version: administration.version,
            dose: administration.dose,
            time_given: administration.time_given,
            patient: patient.into(),
            medication: medication.into(),
        }
    }

    /// Build an update request that replaces this record with new fields.
    pub fn to_request(&self) -> AdministrationRequest {
        AdministrationRequest {
            id: Some(self.id),
            patient_id: self.patient.id,
            medication_id: self.medication.id,
            dose: self.dose,
            time_given: Some(self.time_given),
        }
    }
}
