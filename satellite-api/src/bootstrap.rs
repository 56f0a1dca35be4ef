//! Startup Seeding
//!
//! An optional JSON document applied once at startup, before the listener
//! binds:
//!
//! ```json
//! {
//!   "domains": [{ "name": "acme.example", "auth": { "type": "basic" },
//!                 "storage": { "type": "memory", "bucket": "site" } }],
//!   "users":   [{ "domain": "acme.example", "username": "alice", "password": "..." }],
//!   "objects": [{ "domain": "acme.example", "path": "/index.html", "content": "<h1>hi</h1>" }]
//! }
//! ```
//!
//! Domains are written first, so users and objects may reference them.

use std::path::Path;

use bytes::Bytes;
use satellite_core::{DomainRecord, ObjectPath};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Default, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    pub domains: Vec<DomainRecord>,
    #[serde(default)]
    pub users: Vec<BootstrapUser>,
    #[serde(default)]
    pub objects: Vec<BootstrapObject>,
}

#[derive(Deserialize)]
pub struct BootstrapUser {
    pub domain: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapObject {
    pub domain: String,
    pub path: String,
    pub content: String,
}

/// Counts of what [`apply`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub domains: usize,
    pub users: usize,
    pub objects: usize,
}

/// Read and parse a bootstrap document.
pub async fn load_file(path: &Path) -> ApiResult<Bootstrap> {
    let raw = tokio::fs::read(path).await.map_err(|e| {
        ApiError::internal_error(format!("Failed to read bootstrap file {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Write every domain, user and object in `bootstrap`.
///
/// Stops at the first failure; earlier writes are kept.
pub async fn apply(state: &AppState, bootstrap: Bootstrap) -> ApiResult<BootstrapSummary> {
    let mut summary = BootstrapSummary::default();

    for domain in bootstrap.domains {
        if domain.namespace().is_none() {
            return Err(ApiError::invalid_input(format!(
                "Domain name {:?} is not a valid host name",
                domain.name
            )));
        }
        state.tenants.put(domain).await?;
        summary.domains += 1;
    }

    for user in bootstrap.users {
        let record = state.resolver.record(&user.domain).await?;
        let namespace = record.namespace().ok_or_else(|| {
            ApiError::tenant_misconfigured(&record.name, "domain", &record.name)
        })?;
        state
            .credentials
            .add_user(&namespace, &user.username, SecretString::from(user.password))
            .await?;
        summary.users += 1;
    }

    for object in bootstrap.objects {
        let tenant = state.resolver.resolve(&object.domain).await?;
        let path = ObjectPath::parse(&object.path).ok_or_else(|| {
            ApiError::invalid_input(format!("Object path {:?} is not clean", object.path))
        })?;
        tenant
            .storage
            .put(&tenant.location(path), Bytes::from(object.content))
            .await?;
        summary.objects += 1;
    }

    info!(
        domains = summary.domains,
        users = summary.users,
        objects = summary.objects,
        "bootstrap applied"
    );
    Ok(summary)
}
