//! OpenMRS patient wire models.
//!
//! Responsibilities:
//! - Mirror the fields selected by [`PATIENT_CUSTOM_REPRESENTATION`](crate::PATIENT_CUSTOM_REPRESENTATION)
//! - Decode response bodies, reporting the failing JSON path on mismatch
//!
//! Notes:
//! - The server adds fields the representation did not ask for (`links`, `resourceVersion`), so
//!   unknown keys are ignored rather than rejected.
//! - Everything below the patient `uuid` is optional. A representation the server cannot fully
//!   satisfy still decodes.

use crate::{OpenmrsError, OpenmrsResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
pub struct Patient;

impl Patient {
    /// Parse a patient resource from a JSON response body.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g.
    /// `person.attributes.0.attributeType`) to the failing field.
    ///
    /// # Errors
    ///
    /// Returns [`OpenmrsError::Translation`] if the body is not JSON or does not match the
    /// patient wire schema.
    pub fn parse(body: &[u8]) -> OpenmrsResult<PatientRecord> {
        let mut deserializer = serde_json::Deserializer::from_slice(body);

        match serde_path_to_error::deserialize::<_, PatientRecord>(&mut deserializer) {
            Ok(parsed) => Ok(parsed),
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                Err(OpenmrsError::Translation(format!(
                    "Patient schema mismatch at {path}: {source}"
                )))
            }
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// A patient as returned for the custom representation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
}

impl PatientRecord {
    /// Person attributes in the order the server returned them.
    ///
    /// Empty when the response carries no person or the person has no `attributes` field.
    pub fn attributes(&self) -> &[Attribute] {
        self.person
            .as_ref()
            .and_then(|person| person.attributes.as_deref())
            .unwrap_or(&[])
    }

    /// Consumes the record, keeping only its person attributes.
    pub fn into_attributes(self) -> Vec<Attribute> {
        self.person
            .and_then(|person| person.attributes)
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<IdentifierLocation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_type: Option<IdentifierType>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
pub struct IdentifierLocation {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierType {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate_estimated: Option<bool>,

    /// A concept reference or free text, depending on server configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub cause_of_death: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_name: Option<PreferredName>,

    /// `None` when the field is missing from the response, which is not the same as an empty
    /// list on the wire. Callers should go through [`PatientRecord::attributes`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_address: Option<PreferredAddress>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferredName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferredAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address6: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address7: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_village: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county_district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
}

/// A typed fact about a person, such as a phone number.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Plain text for most attribute types; a nested object for concept or location types.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: serde_json::Value,

    pub attribute_type: AttributeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voided: Option<bool>,
}

impl Attribute {
    /// The attribute type identifier this attribute is tagged with.
    pub fn attribute_type_uuid(&self) -> &str {
        &self.attribute_type.uuid
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, ToSchema)]
pub struct AttributeType {
    pub uuid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}
