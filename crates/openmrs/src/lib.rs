//! OpenMRS REST wire support for PCX.
//!
//! This crate provides **wire models** for the patient resource returned by the OpenMRS REST
//! web services, together with the custom representation string that selects its fields.
//!
//! This crate focuses on:
//! - the exact field-selection contract with the remote service
//! - deserialisation of response bodies, with a JSON path on schema mismatch
//!
//! It performs no I/O. Transport lives in `pcx-core`.

pub mod patient;
pub mod representation;

// Re-export facades
pub use patient::Patient;
pub use representation::{patient_resource_path, DEFAULT_API_ROOT, PATIENT_CUSTOM_REPRESENTATION};

// Re-export wire types
pub use patient::{
    Attribute, AttributeType, Identifier, IdentifierLocation, IdentifierType, PatientRecord,
    Person, PreferredAddress, PreferredName,
};

/// Errors returned by the `openmrs` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum OpenmrsError {
    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with an [`OpenmrsError`].
pub type OpenmrsResult<T> = Result<T, OpenmrsError>;
