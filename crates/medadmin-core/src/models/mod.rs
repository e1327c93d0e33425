//! Domain models for the medication administration record.

mod administration;
mod medication;
mod patient;

pub use administration::*;
pub use medication::*;
pub use patient::*;
