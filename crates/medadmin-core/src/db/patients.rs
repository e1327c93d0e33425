//! Patient database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{is_constraint_violation, Database, DbError, DbResult};
use crate::models::Patient;

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        given_name: row.get(1)?,
        family_name: row.get(2)?,
    })
}

/// Existence check usable inside a transaction.
pub(crate) fn patient_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?)",
        [id],
        |row| row.get(0),
    )
}

impl Database {
    /// Insert a new patient, returning it with its assigned id.
    pub fn insert_patient(&self, given_name: &str, family_name: &str) -> DbResult<Patient> {
        self.conn.execute(
            "INSERT INTO patients (given_name, family_name) VALUES (?1, ?2)",
            params![given_name, family_name],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(patient_id = id, "patient inserted");

        Ok(Patient {
            id,
            given_name: given_name.to_string(),
            family_name: family_name.to_string(),
        })
    }

    /// Replace a patient's name fields.
    pub fn rename_patient(&self, id: i64, given_name: &str, family_name: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                given_name = ?2,
                family_name = ?3,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![id, given_name, family_name],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                "SELECT id, given_name, family_name FROM patients WHERE id = ?",
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients by family name, then given name.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, given_name, family_name
            FROM patients
            ORDER BY family_name, given_name, id
            "#,
        )?;

        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a patient that no administration references.
    pub fn delete_patient(&self, id: i64) -> DbResult<bool> {
        match self.conn.execute("DELETE FROM patients WHERE id = ?", [id]) {
            Ok(rows_affected) => Ok(rows_affected > 0),
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "patient {} is referenced by administrations",
                id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
