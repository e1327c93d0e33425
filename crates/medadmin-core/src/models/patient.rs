//! Patient models.

use serde::{Deserialize, Serialize};

/// A patient master record.
///
/// Names are maintained by the patient-management process; administrations
/// only ever reference a patient by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patient {
    /// Store-assigned identity
    pub id: i64,
    /// Given (first) name
    pub given_name: String,
    /// Family (last) name
    pub family_name: String,
}

