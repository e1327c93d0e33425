//! Database layer for medadmin.

mod administrations;
mod config;
mod medications;
mod patients;
mod schema;

pub use administrations::*;
pub use config::*;
#[allow(unused_imports)]
pub use medications::*;
#[allow(unused_imports)]
pub use patients::*;
pub use schema::*;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

use crate::models::ReferenceField;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Unknown {field}: {id}")]
    Reference { field: ReferenceField, id: i64 },

    #[error("Version conflict on administration {id}: expected {expected}, found {actual}")]
    Conflict { id: i64, expected: i64, actual: i64 },
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
///
/// Each `Database` owns one SQLite connection. Several handles may be opened
/// on the same file; writes from different handles are serialized by
/// SQLite's immediate transactions.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_config(&DatabaseConfig::file(path.as_ref()))
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_with_config(&DatabaseConfig::in_memory())
    }

    /// Open database described by `config`.
    pub fn open_with_config(config: &DatabaseConfig) -> DbResult<Self> {
        let conn = match config.location() {
            StorageLocation::InMemory => Connection::open_in_memory()?,
            StorageLocation::File(path) => Connection::open(path)?,
        };
        conn.busy_timeout(config.busy_timeout())?;

        let db = Self { conn };
        db.initialize()?;
        tracing::debug!(
            path = ?config.path(),
            busy_timeout_ms = config.busy_timeout().as_millis() as u64,
            "database opened"
        );
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction.
    ///
    /// The write lock is taken at `BEGIN`, so reads inside the transaction
    /// cannot be invalidated by another writer before commit.
    pub fn write_transaction(&mut self) -> DbResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

/// True if `err` is SQLite rejecting a write on a constraint.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
