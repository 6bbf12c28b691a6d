//! Contact Attribute Filter.
//!
//! Narrows a patient's attributes to those whose attribute type is in the configured contact
//! allow-list. The allow-list is always passed in by the caller.
//!
//! The filter reports loading state but not fetch errors: a failed read looks the same as a
//! patient with no contact attributes. Callers that need the error go to
//! [`AttributeFetcher`] directly.

use crate::fetcher::{AttributeFetcher, PatientAttributes};
use openmrs::Attribute;
use pcx_types::{AttributeTypeUuid, PatientUuid};
use std::collections::HashSet;

/// Contact attributes of one patient.
#[derive(Debug, Clone)]
pub struct ContactAttributes {
    pub contact_attributes: Vec<Attribute>,
    pub is_loading: bool,
}

impl ContactAttributes {
    pub fn from_patient_attributes(
        patient_attributes: &PatientAttributes,
        configured_type_ids: Option<&[AttributeTypeUuid]>,
    ) -> Self {
        Self {
            contact_attributes: contact_attributes_of(
                &patient_attributes.attributes,
                configured_type_ids,
            ),
            is_loading: patient_attributes.is_loading,
        }
    }
}

/// The sub-sequence of `attributes` whose type is in `configured_type_ids`.
///
/// Absent or empty configuration matches nothing.
pub fn contact_attributes_of(
    attributes: &[Attribute],
    configured_type_ids: Option<&[AttributeTypeUuid]>,
) -> Vec<Attribute> {
    let allowed: HashSet<&str> = configured_type_ids
        .unwrap_or_default()
        .iter()
        .map(AttributeTypeUuid::as_str)
        .collect();

    if allowed.is_empty() {
        return Vec::new();
    }

    attributes
        .iter()
        .filter(|attribute| allowed.contains(attribute.attribute_type_uuid()))
        .cloned()
        .collect()
}

/// Derives contact attributes from an [`AttributeFetcher`].
#[derive(Clone)]
pub struct ContactAttributeFilter {
    fetcher: AttributeFetcher,
}

impl ContactAttributeFilter {
    pub fn new(fetcher: AttributeFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &AttributeFetcher {
        &self.fetcher
    }

    /// Contact attributes of `patient` once its read has settled.
    pub async fn filter_contact_attributes(
        &self,
        patient: &PatientUuid,
        configured_type_ids: Option<&[AttributeTypeUuid]>,
    ) -> ContactAttributes {
        let patient_attributes = self.fetcher.fetch_patient_attributes(patient).await;
        ContactAttributes::from_patient_attributes(&patient_attributes, configured_type_ids)
    }

    /// Snapshot of `patient`'s contact attributes; empty and loading while the read is pending.
    pub async fn contact_attributes(
        &self,
        patient: &PatientUuid,
        configured_type_ids: Option<&[AttributeTypeUuid]>,
    ) -> ContactAttributes {
        let patient_attributes = self.fetcher.patient_attributes(patient).await;
        ContactAttributes::from_patient_attributes(&patient_attributes, configured_type_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::{patient, FakeSource, ABC_123};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn types(ids: &[&str]) -> Vec<AttributeTypeUuid> {
        ids.iter()
            .map(|id| AttributeTypeUuid::new(id).expect("valid type id"))
            .collect()
    }

    fn attributes(body: &str) -> Vec<Attribute> {
        openmrs::Patient::parse(body.as_bytes())
            .expect("valid patient")
            .into_attributes()
    }

    fn filter_for(source: Arc<FakeSource>) -> ContactAttributeFilter {
        ContactAttributeFilter::new(AttributeFetcher::with_cache_capacity(
            source,
            openmrs::DEFAULT_API_ROOT,
            100,
        ))
    }

    const MIXED: &str = r#"{"uuid":"p","person":{"attributes":[
        {"value":"a@b.com","attributeType":{"uuid":"email"}},
        {"value":"Mother","attributeType":{"uuid":"next-of-kin"}},
        {"value":"555-1000","attributeType":{"uuid":"phone"}},
        {"value":"555-2000","attributeType":{"uuid":"phone"}}
    ]}}"#;

    #[test]
    fn type_ids_match_exactly() {
        let padded = types(&[" phone"]);
        assert!(contact_attributes_of(&attributes(MIXED), Some(&padded)).is_empty());

        let body = r#"{"uuid":"p","person":{"attributes":[
            {"value":"555-1000","attributeType":{"uuid":"phone "}}
        ]}}"#;
        let padded_wire = types(&["phone "]);
        assert_eq!(
            contact_attributes_of(&attributes(body), Some(&padded_wire)).len(),
            1
        );
    }

    #[test]
    fn keeps_members_in_input_order() {
        let configured = types(&["phone", "email"]);
        let result = contact_attributes_of(&attributes(MIXED), Some(&configured));

        let values: Vec<&serde_json::Value> = result.iter().map(|a| &a.value).collect();
        assert_eq!(values, vec!["a@b.com", "555-1000", "555-2000"]);
    }

    #[test]
    fn absent_configuration_matches_nothing() {
        assert!(contact_attributes_of(&attributes(MIXED), None).is_empty());
    }

    #[test]
    fn empty_configuration_matches_nothing() {
        assert!(contact_attributes_of(&attributes(MIXED), Some(&[])).is_empty());
    }

    #[test]
    fn unmatched_configuration_yields_empty() {
        let configured = types(&["fax"]);
        assert!(contact_attributes_of(&attributes(MIXED), Some(&configured)).is_empty());
    }

    #[test]
    fn duplicate_configuration_does_not_duplicate_output() {
        let configured = types(&["phone", "phone"]);
        assert_eq!(
            contact_attributes_of(&attributes(MIXED), Some(&configured)).len(),
            2
        );
    }

    #[tokio::test]
    async fn phone_is_the_only_contact_for_abc_123() {
        let source = Arc::new(FakeSource::new().with_patient("abc-123", ABC_123));
        let filter = filter_for(source);
        let configured = types(&["phone"]);

        let result = filter
            .filter_contact_attributes(&patient("abc-123"), Some(&configured))
            .await;

        assert!(!result.is_loading);
        assert_eq!(result.contact_attributes.len(), 1);
        assert_eq!(result.contact_attributes[0].attribute_type_uuid(), "phone");
        assert_eq!(result.contact_attributes[0].value, serde_json::json!("555-1000"));
    }

    #[tokio::test]
    async fn fetch_error_is_swallowed() {
        let source = Arc::new(FakeSource::new());
        let filter = filter_for(source);
        let configured = types(&["phone"]);
        let id = patient("unknown-id");

        let fetched = filter.fetcher().fetch_patient_attributes(&id).await;
        assert!(fetched.error.is_some());
        assert!(fetched.attributes.is_empty());

        let result = filter
            .filter_contact_attributes(&id, Some(&configured))
            .await;
        assert!(!result.is_loading);
        assert!(result.contact_attributes.is_empty());
    }

    #[tokio::test]
    async fn loading_state_is_propagated() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(
            FakeSource::new()
                .with_patient("abc-123", ABC_123)
                .gated(gate.clone()),
        );
        let filter = filter_for(source);
        let configured = types(&["phone"]);
        let id = patient("abc-123");

        let pending = filter.contact_attributes(&id, Some(&configured)).await;
        assert!(pending.is_loading);
        assert!(pending.contact_attributes.is_empty());

        gate.notify_one();
        let settled = filter
            .filter_contact_attributes(&id, Some(&configured))
            .await;
        assert!(!settled.is_loading);
        assert_eq!(settled.contact_attributes.len(), 1);
    }

    #[tokio::test]
    async fn configuration_is_applied_per_call() {
        let source = Arc::new(FakeSource::new().with_patient("abc-123", ABC_123));
        let filter = filter_for(source.clone());
        let id = patient("abc-123");

        let phones = filter
            .filter_contact_attributes(&id, Some(&types(&["phone"])))
            .await;
        let emails = filter
            .filter_contact_attributes(&id, Some(&types(&["email"])))
            .await;
        let none = filter.filter_contact_attributes(&id, None).await;

        assert_eq!(phones.contact_attributes[0].value, serde_json::json!("555-1000"));
        assert_eq!(emails.contact_attributes[0].value, serde_json::json!("a@b.com"));
        assert!(none.contact_attributes.is_empty());
        assert_eq!(source.reads(), 1);
    }
}
