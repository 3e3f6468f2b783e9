// crates/signet-server/src/server.rs
// ============================================================================
// Module: Signet HTTP Server
// Description: HTTP API for document registration, templates, and sign links.
// Purpose: Expose the sign-link lifecycle over authenticated REST endpoints.
// Dependencies: signet-core, signet-pdf, axum, tokio
// ============================================================================

//! ## Overview
//! The HTTP server fronts the sign-link lifecycle engine. Administrative
//! routes (document registration, template authoring, link issuance) require
//! authorization per the configured mode; signer routes are reachable with
//! the sign token alone, which is the capability. All request bodies are
//! untrusted and size-limited, and lifecycle errors map onto stable error
//! codes so clients can branch without parsing messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::USER_AGENT;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use signet_core::CreateTemplateRequest;
use signet_core::DocumentKey;
use signet_core::FieldId;
use signet_core::FilledValue;
use signet_core::InMemoryMetadataStore;
use signet_core::InMemoryObjectStore;
use signet_core::IssueRequest;
use signet_core::LifecycleError;
use signet_core::MetadataStore;
use signet_core::PresignedUrl;
use signet_core::SharedMetadataStore;
use signet_core::SharedObjectStore;
use signet_core::SignLinkLifecycle;
use signet_core::SignToken;
use signet_core::SubmissionResult;
use signet_core::SubmitterInfo;
use signet_core::TemplateId;
use signet_core::Timestamp;
use signet_pdf::PdfFormEngine;
use thiserror::Error;

use crate::auth::AdminAuthz;
use crate::auth::RequestContext;
use crate::config::SignetConfig;
use crate::config::StorageConfig;
use crate::s3_store::S3DocumentStore;
use crate::token::RandTokenGenerator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default content type assumed for uploads without one.
const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

/// Default filename recorded for uploads without one.
const DEFAULT_FILENAME: &str = "document.pdf";

/// Header carrying the original filename of an uploaded document.
const FILENAME_HEADER: &str = "x-signet-filename";

// ============================================================================
// SECTION: Server Errors
// ============================================================================

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration was invalid.
    #[error("config error: {0}")]
    Config(String),
    /// Backend initialization failed.
    #[error("init error: {0}")]
    Init(String),
    /// Transport-level failure while serving.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server State
// ============================================================================

/// Concrete lifecycle engine type used by the server.
type Engine =
    SignLinkLifecycle<SharedMetadataStore, SharedObjectStore, RandTokenGenerator, PdfFormEngine>;

/// Shared application state for request handlers.
pub struct AppState {
    /// Sign-link lifecycle engine.
    engine: Engine,
    /// Metadata store handle for readiness probes.
    store: SharedMetadataStore,
    /// Authorizer for administrative routes.
    authz: AdminAuthz,
}

/// Signet HTTP server instance.
pub struct SignetServer {
    /// Validated server configuration.
    config: SignetConfig,
    /// Shared handler state.
    state: Arc<AppState>,
}

impl SignetServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or storage
    /// backends fail to initialize.
    pub fn from_config(config: SignetConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = SharedMetadataStore::from_store(InMemoryMetadataStore::new());
        let objects = build_object_store(&config.storage)?;
        let engine = SignLinkLifecycle::new(
            store.clone(),
            objects,
            RandTokenGenerator::new(),
            PdfFormEngine::new(),
            config.lifecycle.to_lifecycle_config(),
        );
        let authz = AdminAuthz::from_config(&config.server);
        let state = Arc::new(AppState {
            engine,
            store,
            authz,
        });
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] when the bind address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ServerError> {
        self.config
            .server
            .bind
            .parse()
            .map_err(|_| ServerError::Config("invalid bind address".to_string()))
    }

    /// Builds the API router over the shared state.
    #[must_use]
    pub fn router(&self) -> Router {
        api_router(Arc::clone(&self.state), self.config.server.max_body_bytes)
    }

    /// Serves HTTP requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.bind_addr()?;
        let app = self.router();
        tracing::info!(%addr, "signet server listening");
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| ServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the document object store for the configured backend.
fn build_object_store(storage: &StorageConfig) -> Result<SharedObjectStore, ServerError> {
    match storage {
        StorageConfig::Memory => {
            tracing::warn!("using in-memory document storage; documents do not survive restart");
            Ok(SharedObjectStore::from_store(InMemoryObjectStore::new()))
        }
        StorageConfig::ObjectStore(config) => {
            let store =
                S3DocumentStore::new(config).map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(SharedObjectStore::from_store(store))
        }
    }
}

/// Assembles the API routes.
fn api_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/api/documents", post(register_document))
        .route("/api/templates", post(create_template))
        .route("/api/templates/{template_id}", get(get_template))
        .route("/api/signlinks", post(issue_link))
        .route("/api/signlinks/{token}", get(get_link))
        .route("/api/documents/{key}", get(get_document_url))
        .route("/api/artifacts/{key}", get(get_artifact_url))
        .route("/api/sign/{token}", get(fetch_session).post(submit))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

/// JSON error payload with a stable machine-readable code.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Stable error code.
    error: &'static str,
    /// Human-readable message.
    message: String,
    /// Field identifiers missing from a submission, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<FieldId>>,
}

/// Maps a lifecycle error to an HTTP response.
fn lifecycle_response(error: LifecycleError) -> Response {
    let (status, code, missing) = match &error {
        LifecycleError::TemplateNotFound(_) | LifecycleError::NotFound(_) => {
            (StatusCode::NOT_FOUND, "not_found", None)
        }
        LifecycleError::Expired => (StatusCode::GONE, "expired", None),
        LifecycleError::AlreadyUsed => (StatusCode::GONE, "already_used", None),
        LifecycleError::MissingRequiredFields {
            missing,
        } => (StatusCode::BAD_REQUEST, "missing_required_fields", Some(missing.clone())),
        LifecycleError::InvalidDocument(_) => {
            (StatusCode::BAD_REQUEST, "invalid_document", None)
        }
        LifecycleError::PageLimitExceeded {
            ..
        } => (StatusCode::BAD_REQUEST, "page_limit_exceeded", None),
        LifecycleError::Geometry(_) => (StatusCode::BAD_REQUEST, "invalid_geometry", None),
        LifecycleError::DuplicateField(_) => (StatusCode::BAD_REQUEST, "duplicate_field", None),
        LifecycleError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None),
    };
    let body = ErrorBody {
        error: code,
        message: error.to_string(),
        missing,
    };
    (status, axum::Json(body)).into_response()
}

/// Builds a `401 Unauthorized` response.
fn unauthorized() -> Response {
    let body = ErrorBody {
        error: "unauthorized",
        message: "administrative credentials required".to_string(),
        missing: None,
    };
    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

// ============================================================================
// SECTION: Handler Helpers
// ============================================================================

/// Current wall-clock time as a lifecycle timestamp.
fn current_timestamp() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
}

/// Builds the transport request context for authorization.
fn request_context(peer: SocketAddr, headers: &HeaderMap) -> RequestContext {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    RequestContext {
        peer,
        auth_header,
    }
}

/// Authorizes an administrative request, logging the outcome.
fn require_admin(
    state: &AppState,
    peer: SocketAddr,
    headers: &HeaderMap,
    route: &'static str,
) -> Result<(), Response> {
    let context = request_context(peer, headers);
    match state.authz.authorize(&context) {
        Ok(auth) => {
            tracing::debug!(
                route,
                peer = %peer,
                fingerprint = auth.token_fingerprint.as_deref().unwrap_or("local"),
                "admin request authorized"
            );
            Ok(())
        }
        Err(err) => {
            tracing::warn!(route, peer = %peer, error = %err, "admin request denied");
            Err(unauthorized())
        }
    }
}

/// Extracts submitter details from transport metadata.
fn submitter_info(peer: SocketAddr, headers: &HeaderMap) -> SubmitterInfo {
    let agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    SubmitterInfo {
        address: peer.ip().to_string(),
        agent,
    }
}

// ============================================================================
// SECTION: Request Payloads
// ============================================================================

/// Submission request body for the signer endpoint.
#[derive(Debug, Deserialize)]
struct SubmitBody {
    /// Filled values keyed by field identifier.
    values: Vec<FilledValue>,
}

/// Response body carrying a time-limited retrieval URL.
#[derive(Debug, Serialize)]
struct UrlBody {
    /// Presigned retrieval URL.
    url: PresignedUrl,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Registers an uploaded document (admin).
async fn register_document(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    if let Err(denied) = require_admin(&state, peer, &headers, "register_document") {
        return denied;
    }
    let filename = headers
        .get(FILENAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_FILENAME);
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    match state.engine.register_document(
        filename,
        content_type,
        bytes.to_vec(),
        current_timestamp(),
    ) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => lifecycle_response(err),
    }
}

/// Creates a signing template (admin).
async fn create_template(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<CreateTemplateRequest>,
) -> Response {
    if let Err(denied) = require_admin(&state, peer, &headers, "create_template") {
        return denied;
    }
    match state.engine.create_template(request, current_timestamp()) {
        Ok(template) => (StatusCode::CREATED, axum::Json(template)).into_response(),
        Err(err) => lifecycle_response(err),
    }
}

/// Fetches a template with its fields (admin).
async fn get_template(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(template_id): Path<String>,
) -> Response {
    if let Err(denied) = require_admin(&state, peer, &headers, "get_template") {
        return denied;
    }
    match state.engine.get_template(&TemplateId::new(template_id)) {
        Ok(template) => axum::Json(template).into_response(),
        Err(err) => lifecycle_response(err),
    }
}

/// Issues a single-use sign link (admin).
async fn issue_link(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<IssueRequest>,
) -> Response {
    if let Err(denied) = require_admin(&state, peer, &headers, "issue_link") {
        return denied;
    }
    match state.engine.issue(request, current_timestamp()) {
        Ok(link) => (StatusCode::CREATED, axum::Json(link)).into_response(),
        Err(err) => lifecycle_response(err),
    }
}

/// Reports the effective status of an issued sign link (admin).
async fn get_link(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> Response {
    if let Err(denied) = require_admin(&state, peer, &headers, "get_link") {
        return denied;
    }
    match state.engine.get_link(&SignToken::new(token), current_timestamp()) {
        Ok(link) => axum::Json(link).into_response(),
        Err(err) => lifecycle_response(err),
    }
}

/// Presigns a registered document for retrieval (admin).
async fn get_document_url(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    if let Err(denied) = require_admin(&state, peer, &headers, "get_document_url") {
        return denied;
    }
    match state.engine.document_url(&DocumentKey::new(key)) {
        Ok(url) => axum::Json(UrlBody {
            url,
        })
        .into_response(),
        Err(err) => lifecycle_response(err),
    }
}

/// Presigns a signed artifact for retrieval (admin).
async fn get_artifact_url(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    if let Err(denied) = require_admin(&state, peer, &headers, "get_artifact_url") {
        return denied;
    }
    match state.engine.artifact_url(&DocumentKey::new(key)) {
        Ok(url) => axum::Json(UrlBody {
            url,
        })
        .into_response(),
        Err(err) => lifecycle_response(err),
    }
}

/// Opens a signing session for a sign token (signer).
async fn fetch_session(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Response {
    match state.engine.fetch_session(&SignToken::new(token), current_timestamp()) {
        Ok(session) => axum::Json(session).into_response(),
        Err(err) => lifecycle_response(err),
    }
}

/// Submits filled values for a sign token (signer).
async fn submit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(token): Path<String>,
    axum::Json(body): axum::Json<SubmitBody>,
) -> Response {
    let submitter = submitter_info(peer, &headers);
    match state.engine.submit(
        &SignToken::new(token),
        &body.values,
        &submitter,
        current_timestamp(),
    ) {
        Ok(result) => submission_created(result),
        Err(err) => lifecycle_response(err),
    }
}

/// Builds the `201 Created` response for a completed submission.
fn submission_created(result: SubmissionResult) -> Response {
    (StatusCode::CREATED, axum::Json(result)).into_response()
}

/// Reports readiness of the metadata store.
async fn healthz(State(state): State<Arc<AppState>>) -> Response {
    match state.store.readiness() {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "readiness probe failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use signet_core::AuditId;
    use signet_core::ValidationError;

    use super::*;

    /// Verifies lifecycle errors map onto the documented status codes.
    #[test]
    fn lifecycle_error_status_mapping() {
        let cases = [
            (
                LifecycleError::TemplateNotFound(TemplateId::new("tpl-1")),
                StatusCode::NOT_FOUND,
            ),
            (LifecycleError::NotFound("tok-1".to_string()), StatusCode::NOT_FOUND),
            (LifecycleError::Expired, StatusCode::GONE),
            (LifecycleError::AlreadyUsed, StatusCode::GONE),
            (
                LifecycleError::from(ValidationError::MissingRequiredFields {
                    missing: vec![FieldId::new("sig-1")],
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                LifecycleError::InvalidDocument("not a pdf".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                LifecycleError::PageLimitExceeded {
                    pages: 51,
                    max: 50,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                LifecycleError::DuplicateField(FieldId::new("sig-1")),
                StatusCode::BAD_REQUEST,
            ),
            (
                LifecycleError::Unavailable("store down".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, expected) in cases {
            let response = lifecycle_response(error);
            assert_eq!(response.status(), expected);
        }
    }

    /// Verifies the error body serializes with a stable code and the missing
    /// field list, and omits the list when not applicable.
    #[test]
    fn error_body_json_shape() {
        let body = ErrorBody {
            error: "missing_required_fields",
            message: "required fields are missing".to_string(),
            missing: Some(vec![FieldId::new("sig-1"), FieldId::new("date-1")]),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["error"], "missing_required_fields");
        assert_eq!(value["missing"], serde_json::json!(["sig-1", "date-1"]));

        let bare = ErrorBody {
            error: "expired",
            message: "sign link has expired".to_string(),
            missing: None,
        };
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("missing").is_none());
    }

    /// Verifies completed submissions are reported as created.
    #[test]
    fn submission_reports_created_status() {
        let response = submission_created(SubmissionResult {
            artifact_url: PresignedUrl::new("memory://signed/abc.pdf"),
            audit_id: AuditId::new("audit-1"),
            page_count: 3,
        });
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    /// Verifies the server builds with default in-memory configuration.
    #[test]
    fn from_config_builds_with_defaults() {
        let server = SignetServer::from_config(SignetConfig::default()).unwrap();
        assert_eq!(server.bind_addr().unwrap().port(), 8080);
    }

    /// Verifies submitter info falls back when the user agent is absent.
    #[test]
    fn submitter_info_defaults_agent() {
        let peer: SocketAddr = "203.0.113.5:4242".parse().unwrap();
        let info = submitter_info(peer, &HeaderMap::new());
        assert_eq!(info.address, "203.0.113.5");
        assert_eq!(info.agent, "unknown");
    }

    /// Verifies the request context picks up the authorization header.
    #[test]
    fn request_context_captures_authorization() {
        let peer: SocketAddr = "127.0.0.1:4242".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer secret".parse().unwrap());
        let context = request_context(peer, &headers);
        assert_eq!(context.auth_header.as_deref(), Some("Bearer secret"));
    }
}
