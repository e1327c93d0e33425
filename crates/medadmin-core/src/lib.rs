//! MedAdmin Core Library
//!
//! Records and audits medication administrations: which patient received
//! which medication, how much, and when.
//!
//! # Architecture
//!
//! ```text
//!        Transport (HTTP / mobile FFI)
//!                    │
//!                    ▼
//!         ┌─────────────────────┐
//!         │ AdministrationManager│  identity → references → fields
//!         │  resolved views      │  conflict → not found if deleted
//!         └──────────┬──────────┘
//!                    │
//!                    ▼
//!         ┌─────────────────────┐
//!         │      Database       │  patients / medications / administrations
//!         │ immediate txn + CAS │  version compare-and-set per write
//!         └─────────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **No dangling references, no lost updates.** Every write checks its
//! patient and medication references and its version inside one transaction.
//!
//! # Modules
//!
//! - [`db`]: SQLite store with optimistic versioning
//! - [`models`]: Domain types (Patient, Medication, Administration, views)
//! - [`manager`]: The five administration operations

pub mod db;
pub mod manager;
pub mod models;

// Re-export commonly used types
pub use db::{Database, DatabaseConfig, DbError};
pub use manager::{AdministrationError, AdministrationManager, ErrorClass};
pub use models::{
    Administration, AdministrationRequest, AdministrationView, Medication, Patient,
    ReferenceField, ValidationError,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedAdminError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Reference error: {0}")]
    ReferenceError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Identity mismatch: {0}")]
    IdentityMismatch(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<AdministrationError> for MedAdminError {
    fn from(e: AdministrationError) -> Self {
        let message = e.to_string();
        match e {
            AdministrationError::NotFound(_) => MedAdminError::NotFound(message),
            AdministrationError::Reference { .. } => MedAdminError::ReferenceError(message),
            AdministrationError::InvalidInput(_) => MedAdminError::InvalidInput(message),
            AdministrationError::IdentityMismatch { .. } => MedAdminError::IdentityMismatch(message),
            AdministrationError::Conflict { .. } => MedAdminError::ConcurrencyConflict(message),
            AdministrationError::Inconsistent(_) | AdministrationError::Database(_) => {
                MedAdminError::DatabaseError(message)
            }
        }
    }
}

impl From<DbError> for MedAdminError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Constraint(message) => MedAdminError::ConstraintViolation(message),
            other => AdministrationError::from(other).into(),
        }
    }
}

impl From<serde_json::Error> for MedAdminError {
    fn from(e: serde_json::Error) -> Self {
        MedAdminError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedAdminError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedAdminError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MedAdminCore>, MedAdminError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(MedAdminCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MedAdminCore>, MedAdminError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(MedAdminCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct MedAdminCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl MedAdminCore {
    // =========================================================================
    // Master Records
    // =========================================================================

    /// Register a patient.
    pub fn register_patient(
        &self,
        given_name: String,
        family_name: String,
    ) -> Result<FfiPatient, MedAdminError> {
        let db = self.db.lock()?;
        let patient = db.insert_patient(&given_name, &family_name)?;
        Ok(patient.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, MedAdminError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(id)?.map(|p| p.into()))
    }

    /// List all patients.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, MedAdminError> {
        let db = self.db.lock()?;
        Ok(db.list_patients()?.into_iter().map(|p| p.into()).collect())
    }

    /// Register a medication.
    pub fn register_medication(&self, name: String) -> Result<FfiMedication, MedAdminError> {
        let db = self.db.lock()?;
        let medication = db.insert_medication(&name)?;
        Ok(medication.into())
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: i64) -> Result<Option<FfiMedication>, MedAdminError> {
        let db = self.db.lock()?;
        Ok(db.get_medication(id)?.map(|m| m.into()))
    }

    /// List all medications.
    pub fn list_medications(&self) -> Result<Vec<FfiMedication>, MedAdminError> {
        let db = self.db.lock()?;
        Ok(db.list_medications()?.into_iter().map(|m| m.into()).collect())
    }

    /// Remove a patient with no recorded administrations.
    pub fn remove_patient(&self, id: i64) -> Result<bool, MedAdminError> {
        let db = self.db.lock()?;
        Ok(db.delete_patient(id)?)
    }

    /// Remove a medication with no recorded administrations.
    pub fn remove_medication(&self, id: i64) -> Result<bool, MedAdminError> {
        let db = self.db.lock()?;
        Ok(db.delete_medication(id)?)
    }

    // =========================================================================
    // Administration Operations
    // =========================================================================

    /// List all administrations in creation order.
    pub fn list_administrations(&self) -> Result<Vec<FfiAdministration>, MedAdminError> {
        let mut db = self.db.lock()?;
        let manager = AdministrationManager::new(&mut db);
        Ok(manager.list()?.into_iter().map(|v| v.into()).collect())
    }

    /// List one patient's administrations.
    pub fn list_patient_administrations(
        &self,
        patient_id: i64,
    ) -> Result<Vec<FfiAdministration>, MedAdminError> {
        let mut db = self.db.lock()?;
        let manager = AdministrationManager::new(&mut db);
        Ok(manager
            .list_for_patient(patient_id)?
            .into_iter()
            .map(|v| v.into())
            .collect())
    }

    /// Get an administration by ID.
    pub fn get_administration(&self, id: i64) -> Result<FfiAdministration, MedAdminError> {
        let mut db = self.db.lock()?;
        let manager = AdministrationManager::new(&mut db);
        Ok(manager.get(id)?.into())
    }

    /// Record a new administration.
    pub fn create_administration(
        &self,
        input: FfiAdministrationInput,
    ) -> Result<FfiAdministration, MedAdminError> {
        let (request, time_error) = input.into_request();
        let mut db = self.db.lock()?;
        let mut manager = AdministrationManager::new(&mut db);
        manager
            .create(&request)
            .map(Into::into)
            .map_err(|e| administration_error(e, time_error))
    }

    /// Replace an administration's fields; `expected_version` is the version last read.
    pub fn update_administration(
        &self,
        id: i64,
        expected_version: i64,
        input: FfiAdministrationInput,
    ) -> Result<FfiAdministration, MedAdminError> {
        let (request, time_error) = input.into_request();
        let mut db = self.db.lock()?;
        let mut manager = AdministrationManager::new(&mut db);
        manager
            .update(id, expected_version, &request)
            .map(Into::into)
            .map_err(|e| administration_error(e, time_error))
    }

    /// Delete an administration, returning the removed record.
    pub fn delete_administration(&self, id: i64) -> Result<FfiAdministration, MedAdminError> {
        let mut db = self.db.lock()?;
        let mut manager = AdministrationManager::new(&mut db);
        Ok(manager.delete(id)?.into())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export all administrations as JSON.
    pub fn export_administrations_json(&self) -> Result<String, MedAdminError> {
        let mut db = self.db.lock()?;
        let manager = AdministrationManager::new(&mut db);
        let views = manager.list()?;
        Ok(serde_json::to_string_pretty(&views)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub given_name: String,
    pub family_name: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            given_name: patient.given_name,
            family_name: patient.family_name,
        }
    }
}

impl From<models::PatientRef> for FfiPatient {
    fn from(patient: models::PatientRef) -> Self {
        Self {
            id: patient.id,
            given_name: patient.given_name,
            family_name: patient.family_name,
        }
    }
}

/// FFI-safe medication.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiMedication {
    pub id: i64,
    pub name: String,
}

impl From<Medication> for FfiMedication {
    fn from(medication: Medication) -> Self {
        Self {
            id: medication.id,
            name: medication.name,
        }
    }
}

impl From<models::MedicationRef> for FfiMedication {
    fn from(medication: models::MedicationRef) -> Self {
        Self {
            id: medication.id,
            name: medication.name,
        }
    }
}

/// FFI-safe resolved administration.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiAdministration {
    pub id: i64,
    pub version: i64,
    pub dose: f64,
    /// RFC 3339 timestamp
    pub time_given: String,
    pub patient: FfiPatient,
    pub medication: FfiMedication,
}

impl From<AdministrationView> for FfiAdministration {
    fn from(view: AdministrationView) -> Self {
        Self {
            id: view.id,
            version: view.version,
            dose: view.dose,
            time_given: view.time_given.to_rfc3339(),
            patient: view.patient.into(),
            medication: view.medication.into(),
        }
    }
}

/// FFI-safe administration input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdministrationInput {
    pub id: Option<i64>,
    pub patient_id: i64,
    pub medication_id: i64,
    pub dose: f64,
    /// RFC 3339 timestamp
    pub time_given: Option<String>,
}

impl FfiAdministrationInput {
    /// Convert to a manager request. An unparseable timestamp is passed on as
    /// missing and its parse error returned alongside, so reference checks
    /// still run before field checks.
    fn into_request(self) -> (AdministrationRequest, Option<String>) {
        let (time_given, time_error) = match self.time_given {
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(t) => (Some(t.with_timezone(&Utc)), None),
                Err(e) => (None, Some(format!("time_given {:?}: {}", raw, e))),
            },
            None => (None, None),
        };

        let request = AdministrationRequest {
            id: self.id,
            patient_id: self.patient_id,
            medication_id: self.medication_id,
            dose: self.dose,
            time_given,
        };
        (request, time_error)
    }
}

/// Report a timestamp parse failure in place of the "missing" it was mapped to.
fn administration_error(e: AdministrationError, time_error: Option<String>) -> MedAdminError {
    match (e, time_error) {
        (AdministrationError::InvalidInput(ValidationError::MissingTimeGiven), Some(message)) => {
            MedAdminError::InvalidInput(message)
        }
        (e, _) => e.into(),
    }
}
