//! # PCX Core
//!
//! Core logic for reading a patient's person attributes and deriving their contact attributes.
//!
//! This crate contains:
//! - Configuration resolved once at startup ([`CoreConfig`], [`ContactConfig`])
//! - The [`PatientSource`] seam and its REST implementation
//! - A keyed, immutable request cache shared by concurrent callers
//! - The [`AttributeFetcher`] and [`ContactAttributeFilter`]
//!
//! **No API concerns**: HTTP servers and CLIs belong in `api-rest` and `pcx-cli`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod contacts;
pub mod error;
pub mod fetcher;
pub mod source;

pub use config::{ContactConfig, CoreConfig, Credentials};
pub use constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_TIMEOUT_SECS};
pub use contacts::{contact_attributes_of, ContactAttributeFilter, ContactAttributes};
pub use error::{AttributeError, AttributeResult};
pub use fetcher::{AttributeFetcher, FetchResult, PatientAttributes};
pub use source::{PatientSource, RestPatientSource};

pub use openmrs::{
    Attribute, AttributeType, Patient, PatientRecord, PATIENT_CUSTOM_REPRESENTATION,
};
pub use pcx_types::{AttributeTypeUuid, PatientUuid};

use std::sync::Arc;

/// Wire a REST-backed filter (and its fetcher) from configuration.
pub fn contact_attribute_filter(cfg: &CoreConfig) -> AttributeResult<ContactAttributeFilter> {
    let source = RestPatientSource::new(cfg)?;
    let fetcher = AttributeFetcher::new(Arc::new(source), cfg);
    Ok(ContactAttributeFilter::new(fetcher))
}
