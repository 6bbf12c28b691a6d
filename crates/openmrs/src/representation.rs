//! Representation strings and resource paths.
//!
//! The custom representation is a compatibility contract with the remote service: every nested
//! field name in it changes what the server returns. Keep it byte-for-byte stable.

/// Default REST root of an OpenMRS server, relative to its base URL.
pub const DEFAULT_API_ROOT: &str = "/ws/rest/v1";

/// Field selection for patient reads: identifiers plus the person's demographics, preferred name,
/// attributes and preferred address.
pub const PATIENT_CUSTOM_REPRESENTATION: &str = "custom:(uuid,display,identifiers:(identifier,uuid,preferred,location:(uuid,name),identifierType:(uuid,name,format,formatDescription,validator)),person:(uuid,display,gender,birthdate,dead,age,deathDate,birthdateEstimated,causeOfDeath,preferredName:(uuid,preferred,givenName,middleName,familyName),attributes,preferredAddress:(uuid,preferred,address1,address2,cityVillage,longitude,stateProvince,latitude,country,postalCode,countyDistrict,address3,address4,address5,address6,address7)))";

/// Build the request path for a patient read: `{api_root}/patient/{patient_uuid}?v={representation}`.
///
/// The result is the identity of the read. Two calls produce the same string exactly when they
/// would fetch the same resource with the same field selection, so it doubles as a cache key.
pub fn patient_resource_path(api_root: &str, patient_uuid: &str, representation: &str) -> String {
    let api_root = api_root.trim_end_matches('/');
    format!("{api_root}/patient/{patient_uuid}?v={representation}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representation_requests_person_attributes() {
        assert!(PATIENT_CUSTOM_REPRESENTATION.starts_with("custom:(uuid,display,identifiers:"));
        assert!(PATIENT_CUSTOM_REPRESENTATION.contains(",attributes,preferredAddress:("));
        let opens = PATIENT_CUSTOM_REPRESENTATION.matches('(').count();
        let closes = PATIENT_CUSTOM_REPRESENTATION.matches(')').count();
        assert_eq!(opens, closes);
    }

    #[test]
    fn resource_path_matches_rest_layout() {
        let path = patient_resource_path(DEFAULT_API_ROOT, "abc-123", "full");
        assert_eq!(path, "/ws/rest/v1/patient/abc-123?v=full");
    }

    #[test]
    fn resource_path_ignores_trailing_slash_on_root() {
        let path = patient_resource_path("/openmrs/ws/rest/v1/", "abc-123", "default");
        assert_eq!(path, "/openmrs/ws/rest/v1/patient/abc-123?v=default");
    }
}
