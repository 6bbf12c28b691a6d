//! Patient reads from the remote service.
//!
//! [`PatientSource`] is the seam between the fetcher and the transport. Production code uses
//! [`RestPatientSource`]; tests substitute in-memory sources.

use crate::config::{CoreConfig, Credentials};
use crate::{AttributeError, AttributeResult};
use async_trait::async_trait;
use openmrs::{Patient, PatientRecord};
use pcx_types::PatientUuid;
use reqwest::{header::ACCEPT, StatusCode, Url};

/// A single read of one patient representation.
///
/// Implementations perform exactly one attempt per call. Retry and caching belong to callers.
#[async_trait]
pub trait PatientSource: Send + Sync {
    async fn fetch_patient(
        &self,
        patient: &PatientUuid,
        representation: &str,
    ) -> AttributeResult<PatientRecord>;
}

/// Reads patients over the OpenMRS REST web services.
#[derive(Clone, Debug)]
pub struct RestPatientSource {
    client: reqwest::Client,
    base_url: Url,
    api_root: String,
    credentials: Option<Credentials>,
}

impl RestPatientSource {
    /// Creates a source for the server described by `cfg`.
    ///
    /// The timeout in `cfg` applies to each read as a whole.
    pub fn new(cfg: &CoreConfig) -> AttributeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .map_err(AttributeError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: cfg.base_url().clone(),
            api_root: cfg.api_root().to_string(),
            credentials: cfg.credentials().cloned(),
        })
    }

    /// `{base_url}{api_root}/patient/{patient}?v={representation}`, with the patient id encoded
    /// as a single path segment.
    pub fn patient_url(
        &self,
        patient: &PatientUuid,
        representation: &str,
    ) -> AttributeResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AttributeError::Config("base URL cannot carry a path".into()))?;
            segments.pop_if_empty();
            segments.extend(self.api_root.split('/').filter(|s| !s.is_empty()));
            segments.push("patient");
            segments.push(patient.as_str());
        }
        url.query_pairs_mut().append_pair("v", representation);
        Ok(url)
    }
}

#[async_trait]
impl PatientSource for RestPatientSource {
    async fn fetch_patient(
        &self,
        patient: &PatientUuid,
        representation: &str,
    ) -> AttributeResult<PatientRecord> {
        let url = self.patient_url(patient, representation)?;

        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json");
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request.send().await.map_err(AttributeError::Transport)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(AttributeError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(AttributeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(AttributeError::Transport)?;
        Ok(Patient::parse(&body)?)
    }
}
