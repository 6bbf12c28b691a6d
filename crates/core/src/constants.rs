//! Constants used throughout the PCX core crate.

/// Default per-request timeout for patient reads, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of patients whose settled reads are kept in the request cache.
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Configuration key holding the contact attribute type allow-list.
pub const CONTACT_ATTRIBUTE_TYPE_KEY: &str = "contactAttributeType";

/// Base URL used when `PCX_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/openmrs";

/// Environment variable names read by the PCX binaries.
pub const ENV_BASE_URL: &str = "PCX_BASE_URL";
pub const ENV_API_ROOT: &str = "PCX_API_ROOT";
pub const ENV_TIMEOUT_SECS: &str = "PCX_TIMEOUT_SECS";
pub const ENV_CACHE_CAPACITY: &str = "PCX_CACHE_CAPACITY";
pub const ENV_USERNAME: &str = "PCX_USERNAME";
pub const ENV_PASSWORD: &str = "PCX_PASSWORD";
pub const ENV_CONFIG: &str = "PCX_CONFIG";
