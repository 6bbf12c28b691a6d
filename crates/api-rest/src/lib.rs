//! # API REST
//!
//! REST API implementation for PCX.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, status codes, CORS)
//!
//! Uses `pcx-core` for all attribute reads; this crate only translates between HTTP and the
//! fetcher/filter results.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use pcx_core::{
    AttributeError, ContactAttributeFilter, ContactAttributes, ContactConfig, PatientAttributes,
    PatientUuid,
};

/// Application state shared across REST API handlers
///
/// Holds the contact filter (which owns the attribute fetcher and its cache) and the
/// application configuration whose allow-list is handed to the filter on every request.
#[derive(Clone)]
pub struct AppState {
    filter: ContactAttributeFilter,
    contact_config: Arc<ContactConfig>,
}

impl AppState {
    pub fn new(filter: ContactAttributeFilter, contact_config: ContactConfig) -> Self {
        Self {
            filter,
            contact_config: Arc::new(contact_config),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientAttributesRes {
    pub is_loading: bool,
    pub attributes: Vec<pcx_core::Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<PatientAttributes> for PatientAttributesRes {
    fn from(result: PatientAttributes) -> Self {
        Self {
            is_loading: result.is_loading,
            attributes: result.attributes.to_vec(),
            error: result.error.map(|e| e.to_string()),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactAttributesRes {
    pub contact_attributes: Vec<pcx_core::Attribute>,
    pub is_loading: bool,
}

impl From<ContactAttributes> for ContactAttributesRes {
    fn from(result: ContactAttributes) -> Self {
        Self {
            contact_attributes: result.contact_attributes,
            is_loading: result.is_loading,
        }
    }
}

/// Whether to wait for the read to settle (default) or return the current state at once.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadQuery {
    #[serde(default = "default_wait")]
    pub wait: bool,
}

fn default_wait() -> bool {
    true
}

#[derive(OpenApi)]
#[openapi(
    paths(health, patient_attributes, contact_attributes, invalidate_patient),
    components(schemas(
        HealthRes,
        ErrorRes,
        PatientAttributesRes,
        ContactAttributesRes,
        pcx_core::Attribute,
        pcx_core::AttributeType,
    ))
)]
pub struct ApiDoc;

/// Build the REST router with OpenAPI/Swagger documentation.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients/:patient_uuid/attributes", get(patient_attributes))
        .route(
            "/patients/:patient_uuid/contact-attributes",
            get(contact_attributes),
        )
        .route(
            "/patients/:patient_uuid/attributes/cache",
            delete(invalidate_patient),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve the router until the process stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- PCX REST API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "PCX REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients/{patient_uuid}/attributes",
    params(
        ("patient_uuid" = String, Path, description = "Patient identifier"),
        ReadQuery
    ),
    responses(
        (status = 200, description = "Person attributes (or loading state)", body = PatientAttributesRes),
        (status = 400, description = "Invalid patient identifier", body = ErrorRes),
        (status = 404, description = "Patient not found", body = PatientAttributesRes),
        (status = 502, description = "Patient service failed", body = PatientAttributesRes)
    )
)]
/// Read a patient's person attributes
///
/// Returns the settled read by default. With `wait=false` the current state is returned
/// immediately, starting the read in the background if needed.
///
/// # Errors
/// Returns `400 Bad Request` for a blank identifier. A settled read error is reported with
/// `404 Not Found` (unknown patient) or `502 Bad Gateway` (any other failure), carrying the
/// same body shape as a success.
#[axum::debug_handler]
async fn patient_attributes(
    State(state): State<AppState>,
    AxumPath(patient_uuid): AxumPath<String>,
    Query(query): Query<ReadQuery>,
) -> Result<(StatusCode, Json<PatientAttributesRes>), (StatusCode, Json<ErrorRes>)> {
    let patient = parse_patient(&patient_uuid)?;
    let fetcher = state.filter.fetcher();

    let result = if query.wait {
        fetcher.fetch_patient_attributes(&patient).await
    } else {
        fetcher.patient_attributes(&patient).await
    };

    let status = match result.error.as_deref() {
        None => StatusCode::OK,
        Some(AttributeError::NotFound { .. }) => StatusCode::NOT_FOUND,
        Some(err) => {
            tracing::error!("attribute read error for {}: {:?}", patient, err);
            StatusCode::BAD_GATEWAY
        }
    };

    Ok((status, Json(result.into())))
}

#[utoipa::path(
    get,
    path = "/patients/{patient_uuid}/contact-attributes",
    params(
        ("patient_uuid" = String, Path, description = "Patient identifier"),
        ReadQuery
    ),
    responses(
        (status = 200, description = "Contact attributes (or loading state)", body = ContactAttributesRes),
        (status = 400, description = "Invalid patient identifier", body = ErrorRes)
    )
)]
/// Read a patient's contact attributes
///
/// Filters the person attributes by the configured `contactAttributeType` list. Read failures
/// are not reported here: they produce an empty list, the same as a patient without contacts.
#[axum::debug_handler]
async fn contact_attributes(
    State(state): State<AppState>,
    AxumPath(patient_uuid): AxumPath<String>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<ContactAttributesRes>, (StatusCode, Json<ErrorRes>)> {
    let patient = parse_patient(&patient_uuid)?;
    let configured = state.contact_config.contact_attribute_types();

    let result = if query.wait {
        state
            .filter
            .filter_contact_attributes(&patient, configured)
            .await
    } else {
        state.filter.contact_attributes(&patient, configured).await
    };

    Ok(Json(result.into()))
}

#[utoipa::path(
    delete,
    path = "/patients/{patient_uuid}/attributes/cache",
    params(
        ("patient_uuid" = String, Path, description = "Patient identifier")
    ),
    responses(
        (status = 204, description = "Cached read dropped"),
        (status = 400, description = "Invalid patient identifier", body = ErrorRes)
    )
)]
/// Drop the cached read of a patient so the next request reads again
#[axum::debug_handler]
async fn invalidate_patient(
    State(state): State<AppState>,
    AxumPath(patient_uuid): AxumPath<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorRes>)> {
    let patient = parse_patient(&patient_uuid)?;
    state.filter.fetcher().invalidate(&patient).await;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_patient(raw: &str) -> Result<PatientUuid, (StatusCode, Json<ErrorRes>)> {
    PatientUuid::new(raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorRes {
                message: format!("invalid patient identifier: {e}"),
            }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pcx_core::{
        AttributeFetcher, AttributeResult, AttributeTypeUuid, Patient, PatientRecord,
        PatientSource,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct StaticSource {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl PatientSource for StaticSource {
        async fn fetch_patient(
            &self,
            patient: &PatientUuid,
            _representation: &str,
        ) -> AttributeResult<PatientRecord> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            match patient.as_str() {
                "abc-123" => Ok(Patient::parse(
                    br#"{"uuid":"abc-123","person":{"attributes":[
                        {"value":"555-1000","attributeType":{"uuid":"phone"}},
                        {"value":"a@b.com","attributeType":{"uuid":"email"}}
                    ]}}"#,
                )?),
                "flaky" => Err(AttributeError::Status {
                    status: 500,
                    url: "/ws/rest/v1/patient/flaky".into(),
                }),
                _ => Err(AttributeError::NotFound {
                    url: format!("/ws/rest/v1/patient/{patient}"),
                }),
            }
        }
    }

    fn app_with(types: Option<Vec<&str>>) -> (Router, Arc<StaticSource>) {
        let source = Arc::new(StaticSource {
            reads: AtomicUsize::new(0),
        });
        let fetcher = AttributeFetcher::with_cache_capacity(source.clone(), "/ws/rest/v1", 100);
        let configured = types.map(|ids| {
            ids.into_iter()
                .map(|id| AttributeTypeUuid::new(id).expect("valid type id"))
                .collect()
        });
        let state = AppState::new(
            ContactAttributeFilter::new(fetcher),
            ContactConfig::new(configured),
        );
        (router(state), source)
    }

    async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = app_with(None);
        let (status, body) = call(&app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn attributes_returns_all_person_attributes() {
        let (app, _) = app_with(Some(vec!["phone"]));
        let (status, body) = call(&app, "GET", "/patients/abc-123/attributes").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isLoading"], false);
        assert_eq!(body["attributes"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["attributes"][0]["attributeType"]["uuid"], "phone");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn contact_attributes_apply_configuration() {
        let (app, _) = app_with(Some(vec!["phone"]));
        let (status, body) = call(&app, "GET", "/patients/abc-123/contact-attributes").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isLoading"], false);
        let contacts = body["contactAttributes"].as_array().expect("array");
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0]["value"], "555-1000");
    }

    #[tokio::test]
    async fn contact_attributes_without_configuration_are_empty() {
        let (app, _) = app_with(None);
        let (status, body) = call(&app, "GET", "/patients/abc-123/contact-attributes").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contactAttributes"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn unknown_patient_is_404_on_attributes_but_empty_on_contacts() {
        let (app, _) = app_with(Some(vec!["phone"]));

        let (status, body) = call(&app, "GET", "/patients/unknown-id/attributes").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["attributes"], serde_json::json!([]));
        assert!(body["error"]
            .as_str()
            .is_some_and(|e| e.contains("not found")));

        let (status, body) = call(&app, "GET", "/patients/unknown-id/contact-attributes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contactAttributes"], serde_json::json!([]));
        assert_eq!(body["isLoading"], false);
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let (app, _) = app_with(None);
        let (status, body) = call(&app, "GET", "/patients/flaky/attributes").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["isLoading"], false);
    }

    #[tokio::test]
    async fn blank_identifier_is_bad_request() {
        let (app, _) = app_with(None);
        let (status, body) = call(&app, "GET", "/patients/%20/attributes").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().is_some_and(|m| m.contains("empty")));
    }

    #[tokio::test]
    async fn repeated_requests_share_one_read_until_invalidated() {
        let (app, source) = app_with(Some(vec!["phone"]));

        call(&app, "GET", "/patients/abc-123/attributes").await;
        call(&app, "GET", "/patients/abc-123/contact-attributes").await;
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);

        let (status, _) = call(&app, "DELETE", "/patients/abc-123/attributes/cache").await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        call(&app, "GET", "/patients/abc-123/attributes").await;
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() {
        let (app, _) = app_with(None);
        let (status, body) = call(&app, "GET", "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]
            .get("/patients/{patient_uuid}/contact-attributes")
            .is_some());
    }
}
