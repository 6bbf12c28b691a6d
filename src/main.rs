use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use pcx_core::config::{contact_config_from_lookup, core_config_from_lookup};
use pcx_core::contact_attribute_filter;

/// Main entry point for the PCX application
///
/// Resolves configuration from the environment and serves the REST API.
///
/// # Environment Variables
/// - `PCX_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PCX_BASE_URL`: Patient service base URL (default: "http://localhost:8080/openmrs")
/// - `PCX_API_ROOT`: REST root below the base URL (default: "/ws/rest/v1")
/// - `PCX_TIMEOUT_SECS`: Per-read timeout (default: 30)
/// - `PCX_CACHE_CAPACITY`: Patients kept in the request cache (default: 1000)
/// - `PCX_USERNAME` / `PCX_PASSWORD`: Basic credentials for the patient service
/// - `PCX_CONFIG`: YAML/JSON file providing `contactAttributeType`
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pcx_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let lookup = |key: &str| std::env::var(key).ok();

    let rest_addr = lookup("PCX_REST_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into());
    let cfg = core_config_from_lookup(lookup)?;
    let contact_config = contact_config_from_lookup(lookup)?;

    if contact_config.contact_attribute_types().is_none() {
        tracing::warn!("no contactAttributeType configured; contact lookups will be empty");
    }

    tracing::info!("++ Starting PCX REST on {}", rest_addr);
    tracing::info!("++ Reading patients from {}{}", cfg.base_url(), cfg.api_root());

    let state = AppState::new(contact_attribute_filter(&cfg)?, contact_config);
    api_rest::serve(&rest_addr, state).await?;

    Ok(())
}
