//! Tenant resolution.
//!
//! Maps a request host to a [`ResolvedTenant`]: the tenant's namespace plus
//! the concrete authenticator and object store its policies select.

use std::sync::Arc;

use axum::http::{header::HOST, HeaderMap, Uri};
use satellite_core::{
    AuthKind, DomainRecord, Namespace, ObjectLocation, ObjectPath, StorageKind, TenantError,
};
use satellite_storage::{object::validate_bucket, ObjectStore, TenantStore};
use tracing::{debug, error};

use crate::auth::{AllowAll, Authenticator, BasicAuthenticator, CredentialService};

// ============================================================================
// STORAGE BACKENDS
// ============================================================================

/// One shared object store per storage kind. Tenants are kept apart by the
/// namespace in every [`ObjectLocation`], not by separate store instances.
#[derive(Clone)]
pub struct StorageBackends {
    pub memory: Arc<dyn ObjectStore>,
    pub fs: Arc<dyn ObjectStore>,
}

impl StorageBackends {
    pub fn for_kind(&self, kind: StorageKind) -> Arc<dyn ObjectStore> {
        match kind {
            StorageKind::Memory => Arc::clone(&self.memory),
            StorageKind::Fs => Arc::clone(&self.fs),
        }
    }
}

// ============================================================================
// RESOLVED TENANT
// ============================================================================

/// A tenant whose policies have been parsed into capabilities.
#[derive(Clone)]
pub struct ResolvedTenant {
    /// Canonical host name.
    pub name: String,
    pub namespace: Namespace,
    pub auth_kind: AuthKind,
    pub authenticator: Arc<dyn Authenticator>,
    pub storage_kind: StorageKind,
    pub storage: Arc<dyn ObjectStore>,
    pub bucket: String,
}

impl ResolvedTenant {
    /// Where `path` lives for this tenant.
    pub fn location(&self, path: ObjectPath) -> ObjectLocation {
        ObjectLocation::new(self.namespace.clone(), self.bucket.clone(), path)
    }
}

impl std::fmt::Debug for ResolvedTenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedTenant")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("auth_kind", &self.auth_kind)
            .field("storage_kind", &self.storage_kind)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Clone)]
pub struct TenantResolver {
    tenants: Arc<dyn TenantStore>,
    credentials: CredentialService,
    backends: StorageBackends,
}

impl TenantResolver {
    pub fn new(
        tenants: Arc<dyn TenantStore>,
        credentials: CredentialService,
        backends: StorageBackends,
    ) -> Self {
        Self {
            tenants,
            credentials,
            backends,
        }
    }

    /// Look up the record for `host` without interpreting its policies.
    pub async fn record(&self, host: &str) -> Result<DomainRecord, TenantError> {
        match self.tenants.get(host).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(TenantError::Unresolved {
                host: host.to_string(),
            }),
            Err(source) => Err(TenantError::Lookup {
                host: host.to_string(),
                source,
            }),
        }
    }

    /// Resolve `host` into a tenant with live capabilities.
    ///
    /// # Errors
    /// - [`TenantError::Unresolved`] when no record serves `host`
    /// - [`TenantError::Lookup`] when the tenant store fails
    /// - [`TenantError::Misconfigured`] when a policy names an unknown type
    pub async fn resolve(&self, host: &str) -> Result<ResolvedTenant, TenantError> {
        let record = self.record(host).await?;
        let resolved = self.build(record);
        if let Err(TenantError::Misconfigured { host, policy, kind }) = &resolved {
            error!(host = %host, policy = %policy, kind = %kind, "tenant misconfigured");
        }
        resolved
    }

    fn build(&self, record: DomainRecord) -> Result<ResolvedTenant, TenantError> {
        let misconfigured = |policy: &'static str, kind: &str| TenantError::Misconfigured {
            host: record.name.clone(),
            policy,
            kind: kind.to_string(),
        };

        let namespace = record
            .namespace()
            .ok_or_else(|| misconfigured("domain", &record.name))?;

        let auth_kind: AuthKind = record
            .auth
            .kind
            .parse()
            .map_err(|_| misconfigured("auth", &record.auth.kind))?;

        let storage_kind: StorageKind = record
            .storage
            .kind
            .parse()
            .map_err(|_| misconfigured("storage", &record.storage.kind))?;

        if storage_kind == StorageKind::Fs && validate_bucket(&record.storage.bucket).is_err() {
            return Err(misconfigured("storage bucket", &record.storage.bucket));
        }

        let authenticator: Arc<dyn Authenticator> = match auth_kind {
            AuthKind::None => Arc::new(AllowAll),
            AuthKind::Basic => Arc::new(BasicAuthenticator::new(
                namespace.clone(),
                self.credentials.clone(),
            )),
        };

        debug!(
            host = %record.name,
            namespace = %namespace,
            auth = %auth_kind,
            storage = %storage_kind,
            "tenant resolved"
        );

        Ok(ResolvedTenant {
            name: record.name.clone(),
            namespace,
            auth_kind,
            authenticator,
            storage_kind,
            storage: self.backends.for_kind(storage_kind),
            bucket: record.storage.bucket.clone(),
        })
    }
}

// ============================================================================
// HOST EXTRACTION
// ============================================================================

/// Host the request was addressed to: the `Host` header, falling back to the
/// URI authority. Port stripped, lowercased, trailing dot removed.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let raw = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))?;
    normalize_host(raw)
}

fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.rsplit_once('@').map_or(raw, |(_, host)| host);

    let host = if raw.starts_with('[') {
        // IPv6 literal, keep the brackets.
        let end = raw.find(']')?;
        &raw[..=end]
    } else {
        match raw.rsplit_once(':') {
            Some((host, port)) if port.bytes().all(|b| b.is_ascii_digit()) => host,
            Some(_) => return None,
            None => raw,
        }
    };

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Argon2Hasher, HashCost};
    use axum::http::HeaderValue;
    use satellite_storage::{
        InMemoryCredentialStore, InMemoryObjectStore, InMemoryTenantStore,
    };
    use satellite_test_utils::fixtures::acme_domain;

    async fn resolver_with(records: Vec<DomainRecord>) -> TenantResolver {
        let tenants = Arc::new(InMemoryTenantStore::new());
        for record in records {
            tenants.put(record).await.expect("in-memory put");
        }
        let credentials = CredentialService::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(Argon2Hasher::new(HashCost::minimal())),
        );
        let memory: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());
        let backends = StorageBackends {
            memory: memory.clone(),
            fs: memory,
        };
        TenantResolver::new(tenants, credentials, backends)
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Acme.Example:8080").as_deref(), Some("acme.example"));
        assert_eq!(normalize_host("acme.example.").as_deref(), Some("acme.example"));
        assert_eq!(normalize_host("[::1]:8080").as_deref(), Some("[::1]"));
        assert_eq!(normalize_host("acme.example:http"), None);
        assert_eq!(normalize_host(""), None);
    }

    #[test]
    fn test_request_host_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("acme.example:443"));
        let uri: Uri = "http://other.example/index.html".parse().expect("valid uri");
        assert_eq!(request_host(&headers, &uri).as_deref(), Some("acme.example"));

        let headers = HeaderMap::new();
        assert_eq!(request_host(&headers, &uri).as_deref(), Some("other.example"));

        let relative: Uri = "/index.html".parse().expect("valid uri");
        assert_eq!(request_host(&headers, &relative), None);
    }

    #[tokio::test]
    async fn test_resolves_known_tenant() -> Result<(), TenantError> {
        let resolver = resolver_with(vec![acme_domain()]).await;
        let tenant = resolver.resolve("acme.example").await?;
        assert_eq!(tenant.namespace.as_str(), "acme.example");
        assert_eq!(tenant.auth_kind, AuthKind::Basic);
        assert_eq!(tenant.storage_kind, StorageKind::Memory);
        assert_eq!(tenant.bucket, "site");
        Ok(())
    }

    #[tokio::test]
    async fn test_alias_shares_canonical_namespace() -> Result<(), TenantError> {
        let resolver =
            resolver_with(vec![acme_domain().with_alias("www.acme.example")]).await;
        let tenant = resolver.resolve("www.acme.example").await?;
        assert_eq!(tenant.name, "acme.example");
        assert_eq!(tenant.namespace.as_str(), "acme.example");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_host_is_unresolved() {
        let resolver = resolver_with(vec![]).await;
        assert!(matches!(
            resolver.resolve("nobody.example").await,
            Err(TenantError::Unresolved { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_policy_kinds_are_misconfigured() {
        let resolver = resolver_with(vec![
            DomainRecord::new("auth.example")
                .with_auth("oauth")
                .with_storage("memory", "site"),
            DomainRecord::new("storage.example").with_storage("gcs", "site"),
            DomainRecord::new("nostorage.example"),
            DomainRecord::new("bucket.example").with_storage("fs", ".."),
        ])
        .await;

        let cases = [
            ("auth.example", "auth", "oauth"),
            ("storage.example", "storage", "gcs"),
            ("nostorage.example", "storage", ""),
            ("bucket.example", "storage bucket", ".."),
        ];
        for (host, expected_policy, expected_kind) in cases {
            match resolver.resolve(host).await {
                Err(TenantError::Misconfigured { policy, kind, .. }) => {
                    assert_eq!(policy, expected_policy, "{host}");
                    assert_eq!(kind, expected_kind, "{host}");
                }
                other => panic!("{host}: expected misconfigured, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_auth_kind_means_no_auth() -> Result<(), TenantError> {
        let resolver = resolver_with(vec![
            DomainRecord::new("open.example").with_storage("memory", "site")
        ])
        .await;
        let tenant = resolver.resolve("open.example").await?;
        assert_eq!(tenant.auth_kind, AuthKind::None);
        assert!(tenant.authenticator.is_authorized(&HeaderMap::new()).await);
        Ok(())
    }
}
