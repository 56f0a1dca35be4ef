//! Satellite API - Multi-tenant static content server
//!
//! Serves static sites for many tenants from one process. Each request's
//! `Host` selects a tenant, whose stored policies decide how the request is
//! authorized and which object store backs it. Object metadata is cached
//! through [`satellite_storage::MetadataCache`] with a bounded write wait.
//!
//! Admin procedures for configuring tenants live under `/_/rpc/`.

#[macro_use]
pub mod macros;

pub mod admin;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod serve;
pub mod state;
pub mod telemetry;
pub mod tenant;

// Re-export commonly used types
pub use auth::{
    basic_challenge, parse_basic_authorization, AllowAll, Argon2Hasher, Authenticator,
    BasicAuthenticator, CredentialService, HashCost, PasswordHasher,
};
pub use config::{ServerConfig, DEFAULT_AUTH_REALM};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use serve::{serve_file, ServeError};
pub use state::{AppState, Backends};
pub use tenant::{request_host, ResolvedTenant, StorageBackends, TenantResolver};
