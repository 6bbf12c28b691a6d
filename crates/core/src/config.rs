//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Nothing
//! in this crate reads environment variables itself; binaries pass a lookup function (normally
//! `std::env::var`) to [`core_config_from_lookup`] and [`contact_config_from_lookup`].
//!
//! Two pieces are kept apart:
//! - [`CoreConfig`] describes how to reach the patient service.
//! - [`ContactConfig`] is the application configuration that carries the contact attribute type
//!   allow-list. The filter receives that list as an explicit argument.

use crate::constants::{
    CONTACT_ATTRIBUTE_TYPE_KEY, DEFAULT_BASE_URL, DEFAULT_CACHE_CAPACITY, DEFAULT_TIMEOUT_SECS,
    ENV_API_ROOT, ENV_BASE_URL, ENV_CACHE_CAPACITY, ENV_CONFIG, ENV_PASSWORD, ENV_TIMEOUT_SECS,
    ENV_USERNAME,
};
use crate::{AttributeError, AttributeResult};
use pcx_types::AttributeTypeUuid;
use reqwest::Url;
use std::path::Path;
use std::time::Duration;

/// HTTP basic credentials for the patient service.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    base_url: Url,
    api_root: String,
    timeout: Duration,
    cache_capacity: u64,
    credentials: Option<Credentials>,
}

impl CoreConfig {
    /// Create a new `CoreConfig` for the server at `base_url`, with default API root, timeout and
    /// cache capacity.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Config`] if `base_url` is not an absolute `http`/`https` URL.
    pub fn new(base_url: &str) -> AttributeResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| AttributeError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AttributeError::Config(format!(
                "base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }
        if base_url.cannot_be_a_base() {
            return Err(AttributeError::Config("base URL cannot carry a path".into()));
        }

        Ok(Self {
            base_url,
            api_root: openmrs::DEFAULT_API_ROOT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            credentials: None,
        })
    }

    /// Replace the REST root (default `/ws/rest/v1`).
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> AttributeResult<Self> {
        let api_root = api_root.into();
        let trimmed = api_root.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(AttributeError::Config("api root cannot be empty".into()));
        }
        self.api_root = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many patients the request cache keeps. A capacity of zero is rejected, as a cache
    /// that keeps nothing would read the patient again on every call.
    pub fn with_cache_capacity(mut self, cache_capacity: u64) -> AttributeResult<Self> {
        if cache_capacity == 0 {
            return Err(AttributeError::Config("cache capacity must be positive".into()));
        }
        self.cache_capacity = cache_capacity;
        Ok(self)
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache_capacity(&self) -> u64 {
        self.cache_capacity
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

/// Application configuration consumed by the contact filter.
///
/// The surrounding application owns many more keys; only `contactAttributeType` is read here and
/// the rest are ignored. YAML is a superset of JSON, so JSON configuration files load too.
///
/// Every `contactAttributeType` entry must be a non-blank identifier. A single blank entry fails
/// the whole load with [`AttributeError::YamlDeserialization`]; it is not skipped.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactConfig {
    #[serde(default)]
    contact_attribute_type: Option<Vec<AttributeTypeUuid>>,
}

impl ContactConfig {
    pub fn new(contact_attribute_type: Option<Vec<AttributeTypeUuid>>) -> Self {
        Self {
            contact_attribute_type,
        }
    }

    /// Parse configuration text.
    pub fn from_yaml_str(text: &str) -> AttributeResult<Self> {
        serde_yaml::from_str(text).map_err(AttributeError::YamlDeserialization)
    }

    /// Load configuration from a YAML or JSON file.
    pub fn load(path: &Path) -> AttributeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(AttributeError::ConfigRead)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(
            "loaded {} from {}: {} type(s)",
            CONTACT_ATTRIBUTE_TYPE_KEY,
            path.display(),
            config.contact_attribute_types().map_or(0, <[_]>::len)
        );
        Ok(config)
    }

    /// The configured contact attribute types, `None` when the key is absent.
    pub fn contact_attribute_types(&self) -> Option<&[AttributeTypeUuid]> {
        self.contact_attribute_type.as_deref()
    }
}

/// Parse a request timeout in whole seconds from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn timeout_from_env_value(value: Option<String>) -> AttributeResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        Some(v) => {
            let secs = v
                .parse::<u64>()
                .map_err(|e| AttributeError::Config(format!("invalid timeout '{v}': {e}")))?;
            if secs == 0 {
                return Err(AttributeError::Config("timeout must be positive".into()));
            }
            Ok(Duration::from_secs(secs))
        }
    }
}

/// Parse the request cache capacity from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default capacity.
pub fn cache_capacity_from_env_value(value: Option<String>) -> AttributeResult<u64> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_CACHE_CAPACITY),
        Some(v) => {
            let capacity = v.parse::<u64>().map_err(|e| {
                AttributeError::Config(format!("invalid cache capacity '{v}': {e}"))
            })?;
            if capacity == 0 {
                return Err(AttributeError::Config("cache capacity must be positive".into()));
            }
            Ok(capacity)
        }
    }
}

/// Build credentials when both a username and a password are supplied.
///
/// A username without a password (or the reverse) is a configuration error rather than a silent
/// anonymous session.
pub fn credentials_from_env_values(
    username: Option<String>,
    password: Option<String>,
) -> AttributeResult<Option<Credentials>> {
    let username = username.filter(|u| !u.trim().is_empty());
    let password = password.filter(|p| !p.is_empty());

    match (username, password) {
        (Some(username), Some(password)) => Ok(Some(Credentials { username, password })),
        (None, None) => Ok(None),
        _ => Err(AttributeError::Config(
            "username and password must be supplied together".into(),
        )),
    }
}

/// Resolve [`CoreConfig`] from `PCX_*` variables supplied by `lookup`.
///
/// Binaries pass `|key| std::env::var(key).ok()`; tests pass a map.
pub fn core_config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> AttributeResult<CoreConfig> {
    let base_url = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.into());

    let mut cfg = CoreConfig::new(&base_url)?
        .with_timeout(timeout_from_env_value(lookup(ENV_TIMEOUT_SECS))?)
        .with_cache_capacity(cache_capacity_from_env_value(lookup(ENV_CACHE_CAPACITY))?)?
        .with_credentials(credentials_from_env_values(
            lookup(ENV_USERNAME),
            lookup(ENV_PASSWORD),
        )?);

    if let Some(api_root) = lookup(ENV_API_ROOT) {
        cfg = cfg.with_api_root(api_root)?;
    }

    Ok(cfg)
}

/// Resolve [`ContactConfig`] from the file named by `PCX_CONFIG`, if any.
///
/// Without a file the allow-list is absent and every contact lookup is empty.
pub fn contact_config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> AttributeResult<ContactConfig> {
    match lookup(ENV_CONFIG).filter(|p| !p.trim().is_empty()) {
        Some(path) => ContactConfig::load(Path::new(path.trim())),
        None => Ok(ContactConfig::default()),
    }
}
