//! Type definitions for the risk pipeline

pub mod patient;
pub mod report;

pub use patient::{Gender, LabLevel, PatientRecord, RawInput};
pub use report::{ErrorReport, Outcome, RiskReport, Verdict};
