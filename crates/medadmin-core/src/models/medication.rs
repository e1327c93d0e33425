//! Medication models.

use serde::{Deserialize, Serialize};

/// A medication master record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Medication {
    /// Store-assigned identity
    pub id: i64,
    /// Medication name (e.g., "Paracetamol 500mg")
    pub name: String,
}
