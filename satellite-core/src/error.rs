//! Error types for Satellite operations

use thiserror::Error;

/// Errors raised by authoritative backends (object, credential and tenant stores).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid bucket name: {bucket:?}")]
    InvalidBucket { bucket: String },

    #[error("object not found: {path}")]
    NotFound { path: String },

    #[error("invalid timestamp from backend for {path}: {value:?}")]
    InvalidTimestamp { path: String, value: String },

    #[error("backend error: {reason}")]
    Backend { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by a cache backend.
///
/// These never reach a client: the metadata cache treats a failed read as a
/// miss and a failed write as a logged no-op.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Errors raised while managing basic-auth credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The username contains characters outside `[A-Za-z0-9]`.
    #[error("invalid username: {username:?}")]
    InvalidIdentifier { username: String },

    #[error("password hashing failed: {reason}")]
    Hashing { reason: String },

    #[error("credential store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while resolving a request host to a tenant.
#[derive(Debug, Error)]
pub enum TenantError {
    #[error("no tenant configured for host {host:?}")]
    Unresolved { host: String },

    #[error("tenant lookup failed for host {host:?}: {source}")]
    Lookup {
        host: String,
        #[source]
        source: StoreError,
    },

    #[error("tenant {host:?} has unrecognized {policy} type {kind:?}")]
    Misconfigured {
        host: String,
        policy: &'static str,
        kind: String,
    },
}
