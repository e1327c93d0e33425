//! Administration database operations.
//!
//! Every write runs inside one immediate transaction: reference checks,
//! version compare, and mutation commit together or not at all.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::medications::medication_exists;
use super::patients::patient_exists;
use super::{Database, DbError, DbResult};
use crate::models::{
    Administration, Medication, Patient, ReferenceField, ValidAdministration, INITIAL_VERSION,
};

/// An administration with the master records its foreign keys point at.
///
/// The joins are outer joins: a missing patient or medication shows up as
/// `None` instead of silently dropping the administration.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedAdministration {
    pub administration: Administration,
    pub patient: Option<Patient>,
    pub medication: Option<Medication>,
}

const SELECT_JOINED: &str = r#"
    SELECT a.id, a.patient_id, a.medication_id, a.dose, a.time_given, a.version,
           p.id, p.given_name, p.family_name,
           m.id, m.name
    FROM administrations a
    LEFT JOIN patients p ON p.id = a.patient_id
    LEFT JOIN medications m ON m.id = a.medication_id
"#;

fn joined_from_row(row: &Row<'_>) -> rusqlite::Result<JoinedAdministration> {
    let administration = Administration {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        medication_id: row.get(2)?,
        dose: row.get(3)?,
        time_given: row.get(4)?,
        version: row.get(5)?,
    };

    let patient = match row.get::<_, Option<i64>>(6)? {
        Some(id) => Some(Patient {
            id,
            given_name: row.get(7)?,
            family_name: row.get(8)?,
        }),
        None => None,
    };

    let medication = match row.get::<_, Option<i64>>(9)? {
        Some(id) => Some(Medication {
            id,
            name: row.get(10)?,
        }),
        None => None,
    };

    Ok(JoinedAdministration {
        administration,
        patient,
        medication,
    })
}

fn find_joined(conn: &Connection, id: i64) -> rusqlite::Result<Option<JoinedAdministration>> {
    conn.query_row(
        &format!("{} WHERE a.id = ?", SELECT_JOINED),
        [id],
        joined_from_row,
    )
    .optional()
}

fn check_references(conn: &Connection, patient_id: i64, medication_id: i64) -> DbResult<()> {
    if !patient_exists(conn, patient_id)? {
        return Err(DbError::Reference {
            field: ReferenceField::Patient,
            id: patient_id,
        });
    }
    if !medication_exists(conn, medication_id)? {
        return Err(DbError::Reference {
            field: ReferenceField::Medication,
            id: medication_id,
        });
    }
    Ok(())
}

fn not_found(id: i64) -> DbError {
    DbError::NotFound(format!("administration {}", id))
}

impl Database {
    /// Insert a new administration after checking both references.
    pub fn insert_administration(
        &mut self,
        fields: &ValidAdministration,
    ) -> DbResult<Administration> {
        let tx = self.write_transaction()?;
        check_references(&tx, fields.patient_id, fields.medication_id)?;

        tx.execute(
            r#"
            INSERT INTO administrations (
                patient_id, medication_id, dose, time_given, version
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                fields.patient_id,
                fields.medication_id,
                fields.dose,
                fields.time_given,
                INITIAL_VERSION,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(administration_id = id, version = INITIAL_VERSION, "administration inserted");

        Ok(Administration {
            id,
            patient_id: fields.patient_id,
            medication_id: fields.medication_id,
            dose: fields.dose,
            time_given: fields.time_given,
            version: INITIAL_VERSION,
        })
    }

    /// Replace the mutable fields of an administration if its version is
    /// still `expected_version`.
    ///
    /// Checked in order: existence, references, version.
    pub fn update_administration(
        &mut self,
        id: i64,
        expected_version: i64,
        fields: &ValidAdministration,
    ) -> DbResult<Administration> {
        let tx = self.write_transaction()?;

        let actual: Option<i64> = tx
            .query_row(
                "SELECT version FROM administrations WHERE id = ?",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(actual) = actual else {
            return Err(not_found(id));
        };

        check_references(&tx, fields.patient_id, fields.medication_id)?;

        if actual != expected_version {
            return Err(DbError::Conflict {
                id,
                expected: expected_version,
                actual,
            });
        }

        let version = actual + 1;
        tx.execute(
            r#"
            UPDATE administrations SET
                patient_id = ?2,
                medication_id = ?3,
                dose = ?4,
                time_given = ?5,
                version = ?6,
                updated_at = datetime('now')
            WHERE id = ?1 AND version = ?7
            "#,
            params![
                id,
                fields.patient_id,
                fields.medication_id,
                fields.dose,
                fields.time_given,
                version,
                actual,
            ],
        )?;
        tx.commit()?;

        tracing::debug!(administration_id = id, version, "administration updated");

        Ok(Administration {
            id,
            patient_id: fields.patient_id,
            medication_id: fields.medication_id,
            dose: fields.dose,
            time_given: fields.time_given,
            version,
        })
    }

    /// Remove an administration, returning it as it was just before removal.
    pub fn delete_administration(&mut self, id: i64) -> DbResult<JoinedAdministration> {
        let tx = self.write_transaction()?;

        let joined = find_joined(&tx, id)?.ok_or_else(|| not_found(id))?;
        tx.execute("DELETE FROM administrations WHERE id = ?", [id])?;
        tx.commit()?;

        tracing::debug!(administration_id = id, "administration deleted");
        Ok(joined)
    }

    /// Get an administration joined with its patient and medication.
    pub fn get_administration(&self, id: i64) -> DbResult<Option<JoinedAdministration>> {
        find_joined(&self.conn, id).map_err(Into::into)
    }

    /// Check whether an administration exists.
    pub fn administration_exists(&self, id: i64) -> DbResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM administrations WHERE id = ?)",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// List all administrations in creation order.
    pub fn list_administrations(&self) -> DbResult<Vec<JoinedAdministration>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY a.id", SELECT_JOINED))?;

        let rows = stmt.query_map([], joined_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List one patient's administrations in creation order.
    pub fn list_administrations_for_patient(
        &self,
        patient_id: i64,
    ) -> DbResult<Vec<JoinedAdministration>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE a.patient_id = ? ORDER BY a.id",
            SELECT_JOINED
        ))?;

        let rows = stmt.query_map([patient_id], joined_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
