//! Backend collaborator traits.
//!
//! Every method takes the tenant's [`Namespace`] explicitly (directly, via an
//! [`ObjectLocation`], or via a [`NamespacedKey`]). There is no ambient tenant
//! context anywhere in the storage layer.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use satellite_core::{
    CacheError, DomainRecord, Namespace, ObjectAttributes, ObjectLocation, StoreError, Username,
};
use tokio::io::AsyncRead;

use crate::cache::NamespacedKey;

/// Byte stream handed out by [`ObjectStore::open`].
pub type BoxedAsyncRead = Pin<Box<dyn AsyncRead + Send>>;

// ============================================================================
// CACHE
// ============================================================================

/// Fast, lossy key/value cache.
///
/// Eviction and expiry belong to the implementation. Callers must tolerate
/// any entry vanishing or going stale.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Read a raw payload. `Ok(None)` is a miss.
    async fn get(&self, key: &NamespacedKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a raw payload, replacing any previous one.
    async fn set(&self, key: NamespacedKey, payload: Vec<u8>) -> Result<(), CacheError>;

    /// Usage counters.
    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
    /// Approximate payload bytes held.
    pub memory_bytes: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// OBJECTS
// ============================================================================

/// Authoritative blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Live attributes of an object, or `Ok(None)` if it does not exist.
    async fn stat(&self, location: &ObjectLocation)
        -> Result<Option<ObjectAttributes>, StoreError>;

    /// Open the object's bytes for streaming.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if the object vanished since it was stat'ed.
    async fn open(&self, location: &ObjectLocation) -> Result<BoxedAsyncRead, StoreError>;

    /// Write an object, returning its new attributes.
    async fn put(&self, location: &ObjectLocation, body: Bytes)
        -> Result<ObjectAttributes, StoreError>;
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// A persisted basic-auth credential. Only the one-way hash is ever stored.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub username: Username,
    pub password_hash: String,
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Per-namespace credential persistence. Usernames are unique per namespace.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(
        &self,
        namespace: &Namespace,
        username: &Username,
    ) -> Result<Option<StoredCredential>, StoreError>;

    /// Insert or overwrite the credential for `credential.username`.
    async fn put(&self, namespace: &Namespace, credential: StoredCredential)
        -> Result<(), StoreError>;
}

// ============================================================================
// TENANTS
// ============================================================================

/// Tenant configuration persistence, keyed by host name.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Look up the record serving `host` (canonical name or alias).
    async fn get(&self, host: &str) -> Result<Option<DomainRecord>, StoreError>;

    /// Upsert a record under its canonical name, replacing its alias set.
    async fn put(&self, record: DomainRecord) -> Result<(), StoreError>;
}
