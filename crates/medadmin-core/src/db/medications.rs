//! Medication database operations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{is_constraint_violation, Database, DbError, DbResult};
use crate::models::Medication;

fn medication_from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

pub(crate) fn medication_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM medications WHERE id = ?)",
        [id],
        |row| row.get(0),
    )
}

impl Database {
    /// Insert a new medication, returning it with its assigned id.
    pub fn insert_medication(&self, name: &str) -> DbResult<Medication> {
        self.conn
            .execute("INSERT INTO medications (name) VALUES (?)", [name])?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(medication_id = id, "medication inserted");

        Ok(Medication {
            id,
            name: name.to_string(),
        })
    }

    /// Rename a medication.
    pub fn rename_medication(&self, id: i64, name: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE medications SET name = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, name],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a medication by ID.
    pub fn get_medication(&self, id: i64) -> DbResult<Option<Medication>> {
        self.conn
            .query_row(
                "SELECT id, name FROM medications WHERE id = ?",
                [id],
                medication_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all medications by name.
    pub fn list_medications(&self) -> DbResult<Vec<Medication>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM medications ORDER BY name, id")?;

        let rows = stmt.query_map([], medication_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a medication that no administration references.
    pub fn delete_medication(&self, id: i64) -> DbResult<bool> {
        match self.conn.execute("DELETE FROM medications WHERE id = ?", [id]) {
            Ok(rows_affected) => Ok(rows_affected > 0),
            Err(e) if is_constraint_violation(&e) => Err(DbError::Constraint(format!(
                "medication {} is referenced by administrations",
                id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_rename() {
        let db = Database::open_in_memory().unwrap();

        let medication = db.insert_medication("Paracetamol").unwrap();
        assert_eq!(db.get_medication(medication.id).unwrap(), Some(medication.clone()));

        assert!(db.rename_medication(medication.id, "Acetaminophen").unwrap());
        let renamed = db.get_medication(medication.id).unwrap().unwrap();
        assert_eq!(renamed.name, "Acetaminophen");
    }

    #[test]
    fn test_list_medications_sorted() {
        let db = Database::open_in_memory().unwrap();

        db.insert_medication("Morphine").unwrap();
        db.insert_medication("Amoxicillin").unwrap();

        let names: Vec<_> = db
            .list_medications()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Amoxicillin", "Morphine"]);
    }

    #[test]
    fn test_exists() {
        let db = Database::open_in_memory().unwrap();
        let medication = db.insert_medication("Paracetamol").unwrap();

        assert!(medication_exists(db.conn(), medication.id).unwrap());
        assert!(!medication_exists(db.conn(), medication.id + 1).unwrap());
    }
}
