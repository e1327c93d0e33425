//! Manager error taxonomy.

use thiserror::Error;

use crate::db::DbError;
use crate::models::{ReferenceField, ValidationError};

/// Outcomes of the administration operations.
///
/// Each failure is its own variant so callers can decide on retry:
/// only [`AdministrationError::Conflict`] is worth retrying.
#[derive(Error, Debug)]
pub enum AdministrationError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown {field}: {id}")]
    Reference { field: ReferenceField, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("Identity mismatch: path id {path_id}, body id {body_id:?}")]
    IdentityMismatch { path_id: i64, body_id: Option<i64> },

    #[error("Concurrency conflict on administration {id}: expected version {expected}, current {actual}")]
    Conflict { id: i64, expected: i64, actual: i64 },

    #[error("Inconsistent store: {0}")]
    Inconsistent(String),

    #[error("Database error: {0}")]
    Database(#[source] DbError),
}

pub type AdministrationResult<T> = Result<T, AdministrationError>;

/// Keeps the store's specific outcomes specific; only engine failures
/// become [`AdministrationError::Database`].
impl From<DbError> for AdministrationError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => AdministrationError::NotFound(what),
            DbError::Reference { field, id } => AdministrationError::Reference { field, id },
            DbError::Conflict {
                id,
                expected,
                actual,
            } => AdministrationError::Conflict {
                id,
                expected,
                actual,
            },
            other => AdministrationError::Database(other),
        }
    }
}

/// How a transport layer should answer a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorClass {
    /// HTTP status code for this class.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorClass::BadRequest => 400,
            ErrorClass::NotFound => 404,
            ErrorClass::Conflict => 409,
            ErrorClass::Internal => 500,
        }
    }
}

impl AdministrationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AdministrationError::NotFound(_) => ErrorClass::NotFound,
            AdministrationError::Reference { .. }
            | AdministrationError::InvalidInput(_)
            | AdministrationError::IdentityMismatch { .. } => ErrorClass::BadRequest,
            AdministrationError::Conflict { .. } => ErrorClass::Conflict,
            AdministrationError::Inconsistent(_) | AdministrationError::Database(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// True when re-reading and resubmitting may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdministrationError::Conflict { .. })
    }
}
