//! Attribute Fetcher.
//!
//! Reads a patient's representation once and exposes the person attributes as a tri-state
//! [`FetchResult`]. Reads are keyed by the request path, the same string the REST call would use,
//! so two callers asking for the same patient share one read and one settled result.
//!
//! States move one way only: `Loading -> Success | Error`. A settled state is returned as is on
//! every later call; there is no revalidation and no retry.

use crate::cache::RequestCache;
use crate::config::CoreConfig;
use crate::source::PatientSource;
use crate::AttributeError;
use openmrs::{patient_resource_path, Attribute, PATIENT_CUSTOM_REPRESENTATION};
use pcx_types::PatientUuid;
use std::sync::Arc;

/// A settled read: shared attributes on success, shared error on failure.
type Settled = Result<Arc<[Attribute]>, Arc<AttributeError>>;

/// Tri-state result of a keyed read.
#[derive(Debug, Clone)]
pub enum FetchResult<T> {
    /// No settled value yet. Neither data nor error is available.
    Loading,
    Success(T),
    Error(Arc<AttributeError>),
}

impl<T> FetchResult<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchResult::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchResult::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Arc<AttributeError>> {
        match self {
            FetchResult::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, Arc<AttributeError>>> for FetchResult<T> {
    fn from(settled: Result<T, Arc<AttributeError>>) -> Self {
        match settled {
            Ok(data) => FetchResult::Success(data),
            Err(err) => FetchResult::Error(err),
        }
    }
}

/// Caller-facing view of a patient's attributes.
///
/// `attributes` is empty whenever no data is available, whether loading or failed.
#[derive(Debug, Clone)]
pub struct PatientAttributes {
    pub is_loading: bool,
    pub attributes: Arc<[Attribute]>,
    pub error: Option<Arc<AttributeError>>,
}

impl From<FetchResult<Arc<[Attribute]>>> for PatientAttributes {
    fn from(result: FetchResult<Arc<[Attribute]>>) -> Self {
        match result {
            FetchResult::Loading => PatientAttributes {
                is_loading: true,
                attributes: Arc::from(Vec::new()),
                error: None,
            },
            FetchResult::Success(attributes) => PatientAttributes {
                is_loading: false,
                attributes,
                error: None,
            },
            FetchResult::Error(error) => PatientAttributes {
                is_loading: false,
                attributes: Arc::from(Vec::new()),
                error: Some(error),
            },
        }
    }
}

/// Reads and caches person attributes per patient.
///
/// Cloning is cheap and clones share the cache.
#[derive(Clone)]
pub struct AttributeFetcher {
    source: Arc<dyn PatientSource>,
    cache: RequestCache<Settled>,
    api_root: String,
}

impl AttributeFetcher {
    pub fn new(source: Arc<dyn PatientSource>, cfg: &CoreConfig) -> Self {
        Self::with_cache_capacity(source, cfg.api_root(), cfg.cache_capacity())
    }

    pub fn with_cache_capacity(
        source: Arc<dyn PatientSource>,
        api_root: &str,
        cache_capacity: u64,
    ) -> Self {
        Self {
            source,
            cache: RequestCache::new(cache_capacity),
            api_root: api_root.to_string(),
        }
    }

    /// The key a read for `patient` is cached under.
    pub fn cache_key(&self, patient: &PatientUuid) -> String {
        patient_resource_path(
            &self.api_root,
            patient.as_str(),
            PATIENT_CUSTOM_REPRESENTATION,
        )
    }

    /// Wait for the read of `patient` to settle and return it.
    ///
    /// Issues the read if this is the first request for the patient; otherwise joins the read in
    /// flight or returns the cached result.
    pub async fn fetch(&self, patient: &PatientUuid) -> FetchResult<Arc<[Attribute]>> {
        let key = self.cache_key(patient);
        let read = read_attributes(self.source.clone(), patient.clone());

        match self.cache.get_or_read(key, read).await {
            Ok(settled) => settled.into(),
            Err(join_err) => {
                tracing::error!("patient read for {} did not complete: {}", patient, join_err);
                FetchResult::Error(Arc::new(AttributeError::Interrupted(join_err.to_string())))
            }
        }
    }

    /// Current state of the read of `patient`, without waiting.
    ///
    /// Returns the settled result if there is one. Otherwise starts the read in the background
    /// (unless it is already running) and returns [`FetchResult::Loading`].
    pub async fn poll(&self, patient: &PatientUuid) -> FetchResult<Arc<[Attribute]>> {
        let key = self.cache_key(patient);
        if let Some(settled) = self.cache.get(&key).await {
            return settled.into();
        }

        let read = read_attributes(self.source.clone(), patient.clone());
        if self.cache.start(key, read).await {
            tracing::debug!("started background read for patient {}", patient);
        }
        FetchResult::Loading
    }

    /// Settled attributes of `patient`, defaulting to an empty list on error.
    pub async fn fetch_patient_attributes(&self, patient: &PatientUuid) -> PatientAttributes {
        self.fetch(patient).await.into()
    }

    /// Snapshot of `patient`'s attributes; see [`AttributeFetcher::poll`].
    pub async fn patient_attributes(&self, patient: &PatientUuid) -> PatientAttributes {
        self.poll(patient).await.into()
    }

    /// Forget the settled read of `patient` so the next call reads again.
    pub async fn invalidate(&self, patient: &PatientUuid) {
        self.cache.invalidate(&self.cache_key(patient)).await;
        tracing::debug!("invalidated cached read for patient {}", patient);
    }
}

async fn read_attributes(source: Arc<dyn PatientSource>, patient: PatientUuid) -> Settled {
    tracing::debug!("reading attributes for patient {}", patient);

    match source
        .fetch_patient(&patient, PATIENT_CUSTOM_REPRESENTATION)
        .await
    {
        Ok(record) => Ok(Arc::from(record.into_attributes())),
        Err(err) => {
            tracing::warn!("attribute read for patient {} failed: {}", patient, err);
            Err(Arc::new(err))
        }
    }
}
