//! Admin RPC Endpoints
//!
//! JSON-over-POST procedures for configuring tenants:
//!
//! | Route                                    | Effect                                   |
//! |------------------------------------------|------------------------------------------|
//! | `/_/rpc/DomainService.SetDomain`         | Upsert a domain record                   |
//! | `/_/rpc/SettingsService.SetAuth`         | Set the host's auth type                 |
//! | `/_/rpc/SettingsService.SetStorage`      | Set the host's storage type and bucket   |
//! | `/_/rpc/BasicAuthService.AddUser`        | Add a basic-auth user for the host       |
//!
//! Settings and user procedures act on the domain named by the request's
//! `Host`, so they are issued against the site being configured.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use satellite_core::{
    AuthKind, CredentialError, DomainRecord, StorageKind, StoreError, TenantError,
};
use satellite_storage::object::validate_bucket;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::tenant::request_host;

/// Header carrying the admin API key.
pub const ADMIN_KEY_HEADER: &str = "x-api-key";

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDomainRequest {
    pub domain: DomainRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAuthRequest {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStorageRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub bucket: String,
}

#[derive(Deserialize)]
pub struct AddUserRequest {
    pub username: String,
    pub password: String,
}

/// Envelope returned by every procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl RpcResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: ApiError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

/// An [`ApiError`] rendered inside the RPC envelope.
#[derive(Debug)]
pub struct RpcError(pub ApiError);

macro_rules! rpc_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for RpcError {
                fn from(err: $source) -> Self {
                    RpcError(err.into())
                }
            }
        )*
    };
}

rpc_error_from!(JsonRejection, StoreError, CredentialError, TenantError);

impl From<ApiError> for RpcError {
    fn from(err: ApiError) -> Self {
        RpcError(err)
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        (status, Json(RpcResponse::failed(self.0))).into_response()
    }
}

type RpcResult = Result<Json<RpcResponse>, RpcError>;

// ============================================================================
// HANDLERS
// ============================================================================

/// Upsert a domain record. The record's name becomes its namespace, so it
/// must be a valid host name.
pub async fn set_domain(
    State(state): State<AppState>,
    payload: Result<Json<SetDomainRequest>, JsonRejection>,
) -> RpcResult {
    let Json(SetDomainRequest { domain }) = payload?;
    let domain = DomainRecord {
        name: domain.name.trim().to_ascii_lowercase(),
        ..domain
    };

    if domain.namespace().is_none() {
        return Err(ApiError::invalid_input(format!(
            "Domain name {:?} is not a valid host name",
            domain.name
        ))
        .into());
    }

    let name = domain.name.clone();
    state.tenants.put(domain).await?;
    info!(host = %name, "domain updated");
    Ok(Json(RpcResponse::ok()))
}

/// Set the auth type of the request host's domain.
pub async fn set_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    payload: Result<Json<SetAuthRequest>, JsonRejection>,
) -> RpcResult {
    let Json(request) = payload?;
    let kind: AuthKind = request
        .kind
        .parse()
        .map_err(|_| ApiError::invalid_input(format!("Unknown auth type {:?}", request.kind)))?;

    let host = admin_host(&headers, &uri)?;
    let mut record = state.resolver.record(&host).await?;
    record.auth.kind = kind.as_str().to_string();
    state.tenants.put(record).await?;

    info!(host = %host, kind = %kind, "auth policy updated");
    Ok(Json(RpcResponse::ok()))
}

/// Set the storage type and bucket of the request host's domain.
pub async fn set_storage(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    payload: Result<Json<SetStorageRequest>, JsonRejection>,
) -> RpcResult {
    let Json(request) = payload?;
    let kind: StorageKind = request.kind.parse().map_err(|_| {
        ApiError::invalid_input(format!("Unknown storage type {:?}", request.kind))
    })?;
    if kind == StorageKind::Fs {
        validate_bucket(&request.bucket)?;
    }

    let host = admin_host(&headers, &uri)?;
    let mut record = state.resolver.record(&host).await?;
    record.storage.kind = kind.as_str().to_string();
    record.storage.bucket = request.bucket;
    state.tenants.put(record).await?;

    info!(host = %host, kind = %kind, "storage policy updated");
    Ok(Json(RpcResponse::ok()))
}

/// Add (or replace) a basic-auth user in the request host's namespace.
pub async fn add_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    payload: Result<Json<AddUserRequest>, JsonRejection>,
) -> RpcResult {
    let Json(AddUserRequest { username, password }) = payload?;
    let password = SecretString::from(password);

    let host = admin_host(&headers, &uri)?;
    let record = state.resolver.record(&host).await?;
    let namespace = record
        .namespace()
        .ok_or_else(|| ApiError::tenant_misconfigured(&record.name, "domain", &record.name))?;

    state
        .credentials
        .add_user(&namespace, &username, password)
        .await?;

    info!(host = %host, namespace = %namespace, username = %username, "user added");
    Ok(Json(RpcResponse::ok()))
}

/// Unknown procedures under the RPC prefix.
pub async fn unknown_procedure(uri: Uri) -> RpcError {
    RpcError(ApiError::entity_not_found("Procedure", uri.path()))
}

fn admin_host(headers: &HeaderMap, uri: &Uri) -> ApiResult<String> {
    request_host(headers, uri).ok_or_else(|| ApiError::missing_field("Host"))
}

// ============================================================================
// MIDDLEWARE
// ============================================================================

/// Gate admin routes on `X-API-Key`.
///
/// Returns 403 when no admin keys are configured and 401 when the header is
/// missing or does not match a configured key.
pub async fn require_admin_key(
    State(config): State<Arc<ServerConfig>>,
    request: Request,
    next: Next,
) -> Response {
    if !config.admin_enabled() {
        return RpcError(ApiError::forbidden("Admin RPC is disabled")).into_response();
    }

    let presented = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match presented {
        Some(key) if config.is_valid_admin_key(key) => next.run(request).await,
        Some(_) => RpcError(ApiError::unauthorized("Invalid API key")).into_response(),
        None => RpcError(ApiError::unauthorized("Missing X-API-Key header")).into_response(),
    }
}
