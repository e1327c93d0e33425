//! Administration manager: the list / get / create / update / delete
//! operations over administration records.
//!
//! Every successful call returns [`AdministrationView`]s, resolved against
//! the patient and medication records current at the time of the call.
//!
//! Create and update check, in order and before writing anything:
//! 1. identity (update only: the body id matches the target, then the target exists)
//! 2. patient and medication references
//! 3. dose and timestamp
//! 4. version (update only, checked by the store atomically with the write)

mod error;

pub use error::*;

use crate::db::{Database, DbError, JoinedAdministration};
use crate::models::{
    Administration, AdministrationRequest, AdministrationView, ReferenceField,
};

/// Manager over an injected database handle. Holds no state of its own.
pub struct AdministrationManager<'a> {
    db: &'a mut Database,
}

impl<'a> AdministrationManager<'a> {
    /// Create a new manager.
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// All administrations in creation order.
    pub fn list(&self) -> AdministrationResult<Vec<AdministrationView>> {
        self.db
            .list_administrations()?
            .into_iter()
            .map(view_from_joined)
            .collect()
    }

    /// One patient's administrations in creation order.
    pub fn list_for_patient(&self, patient_id: i64) -> AdministrationResult<Vec<AdministrationView>> {
        if self.db.get_patient(patient_id)?.is_none() {
            return Err(AdministrationError::NotFound(format!("patient {}", patient_id)));
        }

        self.db
            .list_administrations_for_patient(patient_id)?
            .into_iter()
            .map(view_from_joined)
            .collect()
    }

    /// Fetch one administration.
    pub fn get(&self, id: i64) -> AdministrationResult<AdministrationView> {
        let joined = self
            .db
            .get_administration(id)?
            .ok_or_else(|| administration_not_found(id))?;
        view_from_joined(joined)
    }

    /// Record a new administration. Any id in the request body is ignored;
    /// the store assigns one.
    pub fn create(&mut self, request: &AdministrationRequest) -> AdministrationResult<AdministrationView> {
        self.check_references(request)?;
        let fields = request.validate()?;

        let administration = self.db.insert_administration(&fields)?;
        tracing::info!(
            administration_id = administration.id,
            patient_id = administration.patient_id,
            medication_id = administration.medication_id,
            "administration recorded"
        );

        self.resolve(administration)
    }

    /// Replace the mutable fields of administration `id`.
    ///
    /// `expected_version` is the version the caller last read. A stale
    /// version yields [`AdministrationError::Conflict`]; the caller re-reads
    /// and decides whether to resubmit.
    pub fn update(
        &mut self,
        id: i64,
        expected_version: i64,
        request: &AdministrationRequest,
    ) -> AdministrationResult<AdministrationView> {
        if request.id != Some(id) {
            return Err(AdministrationError::IdentityMismatch {
                path_id: id,
                body_id: request.id,
            });
        }
        if !self.db.administration_exists(id)? {
            return Err(administration_not_found(id));
        }
        self.check_references(request)?;
        let fields = request.validate()?;

        let administration = match self.db.update_administration(id, expected_version, &fields) {
            Ok(administration) => administration,
            Err(e @ DbError::Conflict { .. }) => {
                let still_exists = self.db.administration_exists(id)?;
                return Err(reinterpret_conflict(e.into(), still_exists));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            administration_id = id,
            version = administration.version,
            "administration updated"
        );

        self.resolve(administration)
    }

    /// Remove administration `id`, returning it as it was just before removal.
    pub fn delete(&mut self, id: i64) -> AdministrationResult<AdministrationView> {
        let joined = self.db.delete_administration(id)?;
        tracing::info!(administration_id = id, "administration deleted");
        view_from_joined(joined)
    }

    fn check_references(&self, request: &AdministrationRequest) -> AdministrationResult<()> {
        if self.db.get_patient(request.patient_id)?.is_none() {
            tracing::warn!(patient_id = request.patient_id, "unknown patient reference");
            return Err(AdministrationError::Reference {
                field: ReferenceField::Patient,
                id: request.patient_id,
            });
        }
        if self.db.get_medication(request.medication_id)?.is_none() {
            tracing::warn!(medication_id = request.medication_id, "unknown medication reference");
            return Err(AdministrationError::Reference {
                field: ReferenceField::Medication,
                id: request.medication_id,
            });
        }
        Ok(())
    }

    /// Join a freshly written administration with its master records.
    ///
    /// Runs after the write has committed, so a master record removed by
    /// another connection in between surfaces as `Inconsistent`.
    fn resolve(&self, administration: Administration) -> AdministrationResult<AdministrationView> {
        let patient = self.db.get_patient(administration.patient_id)?;
        let medication = self.db.get_medication(administration.medication_id)?;
        view_from_joined(JoinedAdministration {
            administration,
            patient,
            medication,
        })
    }
}

fn administration_not_found(id: i64) -> AdministrationError {
    AdministrationError::NotFound(format!("administration {}", id))
}

/// A conflict on a record that no longer exists means it was deleted
/// concurrently; report that instead of the stale version.
fn reinterpret_conflict(err: AdministrationError, still_exists: bool) -> AdministrationError {
    match err {
        AdministrationError::Conflict { id, .. } if !still_exists => {
            tracing::warn!(administration_id = id, "administration deleted during update");
            administration_not_found(id)
        }
        AdministrationError::Conflict {
            id,
            expected,
            actual,
        } => {
            tracing::warn!(administration_id = id, expected, actual, "stale administration version");
            AdministrationError::Conflict {
                id,
                expected,
                actual,
            }
        }
        other => other,
    }
}

/// Referential integrity is enforced on every write, so a missing master
/// record here is a store fault, not a caller error.
fn view_from_joined(joined: JoinedAdministration) -> AdministrationResult<AdministrationView> {
    let JoinedAdministration {
        administration,
        patient,
        medication,
    } = joined;

    let Some(patient) = patient else {
        return Err(inconsistent(format!(
            "administration {} references missing patient {}",
            administration.id, administration.patient_id
        )));
    };
    let Some(medication) = medication else {
        return Err(inconsistent(format!(
            "administration {} references missing medication {}",
            administration.id, administration.medication_id
        )));
    };

    Ok(AdministrationView::new(administration, patient, medication))
}

fn inconsistent(message: String) -> AdministrationError {
    tracing::error!(detail = message.as_str(), "referential integrity violated");
    AdministrationError::Inconsistent(message)
}
