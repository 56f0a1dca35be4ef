//! File serving.
//!
//! Per request: resolve the tenant from the host, authorize, normalize the
//! path, stat it through the metadata cache, answer conditional requests,
//! then stream the object with caching headers.

use std::time::SystemTime;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            ALLOW, CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH, LAST_MODIFIED,
            WWW_AUTHENTICATE, X_FRAME_OPTIONS,
        },
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use satellite_core::{ObjectMetadata, ObjectPath, StoreError, TenantError};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

use crate::auth::basic_challenge;
use crate::state::AppState;
use crate::tenant::request_host;

/// Appended to paths whose final segment has no extension.
pub const INDEX_DOCUMENT: &str = "index.html";

/// `Cache-Control` for `image/*` responses.
pub const IMAGE_CACHE_CONTROL: &str = "private, max-age=3600, s-maxage=3600";

// ============================================================================
// ERRORS
// ============================================================================

/// Terminal failures of the serving pipeline, rendered as plain-text pages.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("no tenant for host {host:?}")]
    TenantUnresolved { host: String },

    #[error("tenant misconfigured: {0}")]
    TenantMisconfigured(TenantError),

    #[error("authorization required")]
    Unauthorized { challenge: String },

    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("stat failed for {path}: {source}")]
    StatFailure {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("object {path} has an unusable entity tag {etag:?}")]
    InvalidMetadata { path: String, etag: String },

    #[error("failed to open {path}: {source}")]
    StreamFailure {
        path: String,
        #[source]
        source: StoreError,
    },
}

impl ServeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServeError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ServeError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ServeError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServeError::TenantUnresolved { .. }
            | ServeError::TenantMisconfigured(_)
            | ServeError::StatFailure { .. }
            | ServeError::InvalidMetadata { .. }
            | ServeError::StreamFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TenantError> for ServeError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::Unresolved { host } => ServeError::TenantUnresolved { host },
            TenantError::Lookup { host, source } => {
                error!(host = %host, error = %source, "tenant lookup failed");
                ServeError::TenantUnresolved { host }
            }
            misconfigured @ TenantError::Misconfigured { .. } => {
                ServeError::TenantMisconfigured(misconfigured)
            }
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, "request rejected");
        }

        let page = format!(
            "{}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error")
        );
        let mut response = (status, page).into_response();
        let headers = response.headers_mut();
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));

        match &self {
            ServeError::Unauthorized { challenge } => {
                if let Ok(value) = HeaderValue::from_str(challenge) {
                    headers.insert(WWW_AUTHENTICATE, value);
                }
            }
            ServeError::MethodNotAllowed(_) => {
                headers.insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            }
            _ => {}
        }
        response
    }
}

// ============================================================================
// HANDLER
// ============================================================================

/// Fallback handler serving every non-admin request.
pub async fn serve_file(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ServeError> {
    let want_body = match method {
        Method::GET => true,
        Method::HEAD => false,
        other => return Err(ServeError::MethodNotAllowed(other)),
    };

    let host = request_host(&headers, &uri).ok_or_else(|| ServeError::TenantUnresolved {
        host: String::new(),
    })?;
    let tenant = state.resolver.resolve(&host).await?;

    if !tenant.authenticator.is_authorized(&headers).await {
        return Err(ServeError::Unauthorized {
            challenge: basic_challenge(&state.config.auth_realm),
        });
    }

    let path = normalize_request_path(uri.path()).ok_or_else(|| ServeError::NotFound {
        path: uri.path().to_string(),
    })?;
    let location = tenant.location(path.clone());

    let metadata = state
        .metadata
        .stat(&location, tenant.storage.as_ref())
        .await
        .map_err(|source| ServeError::StatFailure {
            path: path.to_string(),
            source,
        })?
        .ok_or_else(|| ServeError::NotFound {
            path: path.to_string(),
        })?;

    let etag = HeaderValue::from_str(&metadata.etag).map_err(|_| ServeError::InvalidMetadata {
        path: path.to_string(),
        etag: metadata.etag.clone(),
    })?;
    let last_modified = last_modified_value(&metadata);

    if if_none_match_matches(&headers, &metadata.etag) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        let out = response.headers_mut();
        out.insert(ETAG, etag);
        out.insert(LAST_MODIFIED, last_modified);
        return Ok(response);
    }

    let mime = mime_guess::from_path(path.as_str()).first_or_octet_stream();

    let body = if want_body {
        let reader = tenant
            .storage
            .open(&location)
            .await
            .map_err(|source| ServeError::StreamFailure {
                path: path.to_string(),
                source,
            })?;
        let logged_path = path.to_string();
        let stream = ReaderStream::new(reader).inspect_err(move |e| {
            warn!(path = %logged_path, error = %e, "object stream failed mid-response");
        });
        Body::from_stream(stream)
    } else {
        Body::empty()
    };

    let mut response = Response::new(body);
    let out = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.essence_str()) {
        out.insert(CONTENT_TYPE, value);
    }
    if mime.type_() == mime_guess::mime::IMAGE {
        out.insert(CACHE_CONTROL, HeaderValue::from_static(IMAGE_CACHE_CONTROL));
    }
    out.insert(ETAG, etag);
    out.insert(LAST_MODIFIED, last_modified);
    out.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));

    debug!(host = %tenant.name, path = %path, etag = %metadata.etag, "serving object");
    Ok(response)
}

// ============================================================================
// HELPERS
// ============================================================================

/// Percent-decode and clean a request path, then append [`INDEX_DOCUMENT`]
/// when the final segment has no extension.
///
/// Returns `None` for undecodable paths and for `.`/`..` segments.
pub fn normalize_request_path(raw: &str) -> Option<ObjectPath> {
    let decoded = urlencoding::decode(raw).ok()?;
    let path = ObjectPath::parse(&decoded)?;
    Some(match path.extension() {
        Some(_) => path,
        None => path.join(INDEX_DOCUMENT),
    })
}

/// Whether `If-None-Match` matches `current_etag`: exact tag, `*`, or any
/// entry of a comma-separated list. Weak prefixes are ignored.
pub fn if_none_match_matches(headers: &HeaderMap, current_etag: &str) -> bool {
    let Some(value) = headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let current = strip_weak_prefix(current_etag);
    value
        .split(',')
        .map(str::trim)
        .any(|tag| tag == "*" || strip_weak_prefix(tag) == current)
}

fn strip_weak_prefix(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix("W/").unwrap_or(tag)
}

fn last_modified_value(metadata: &ObjectMetadata) -> HeaderValue {
    let date = httpdate::fmt_http_date(SystemTime::from(metadata.modified));
    HeaderValue::from_str(&date)
        .unwrap_or_else(|_| HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT"))
}
