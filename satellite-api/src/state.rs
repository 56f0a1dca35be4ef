//! Shared application state for Axum routers.

use std::path::Path;
use std::sync::Arc;

use satellite_storage::{
    CacheBackend, CredentialStore, FsObjectStore, InMemoryCache, InMemoryCredentialStore,
    InMemoryObjectStore, InMemoryTenantStore, MetadataCache, TenantStore,
};

use crate::auth::{Argon2Hasher, CredentialService};
use crate::config::ServerConfig;
use crate::tenant::{StorageBackends, TenantResolver};

/// Backend collaborators the server is wired against.
#[derive(Clone)]
pub struct Backends {
    pub tenants: Arc<dyn TenantStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub cache: Arc<dyn CacheBackend>,
    pub objects: StorageBackends,
}

impl Backends {
    /// Process-local stores, plus a filesystem store rooted at `storage_root`.
    pub fn in_memory(storage_root: &Path) -> Self {
        Self {
            tenants: Arc::new(InMemoryTenantStore::new()),
            credentials: Arc::new(InMemoryCredentialStore::new()),
            cache: Arc::new(InMemoryCache::new()),
            objects: StorageBackends {
                memory: Arc::new(InMemoryObjectStore::new()),
                fs: Arc::new(FsObjectStore::new(storage_root)),
            },
        }
    }
}

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tenants: Arc<dyn TenantStore>,
    pub credentials: CredentialService,
    pub resolver: TenantResolver,
    /// Stat cache in front of every tenant's object store.
    pub metadata: MetadataCache,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let backends = Backends::in_memory(&config.storage_root);
        Self::with_backends(config, backends)
    }

    pub fn with_backends(config: ServerConfig, backends: Backends) -> Self {
        let hasher = Arc::new(Argon2Hasher::new(config.hash_cost));
        let credentials = CredentialService::new(backends.credentials, hasher);
        let resolver = TenantResolver::new(
            Arc::clone(&backends.tenants),
            credentials.clone(),
            backends.objects,
        );
        let metadata =
            MetadataCache::new(backends.cache).with_write_timeout(config.cache_write_timeout);

        Self {
            config: Arc::new(config),
            tenants: backends.tenants,
            credentials,
            resolver,
            metadata,
        }
    }
}

crate::impl_from_ref!(Arc<ServerConfig>, config);
