//! Satellite Test Utilities
//!
//! Shared test infrastructure for the Satellite workspace:
//! - Misbehaving cache and object store doubles
//! - Proptest generators for credentials and paths
//! - Fixtures for the `acme.example` tenant

pub use satellite_core::{
    CacheError, DomainRecord, Namespace, ObjectAttributes, ObjectLocation, ObjectPath, StoreError,
    Username,
};
pub use satellite_storage::{
    BoxedAsyncRead, CacheBackend, CacheStats, InMemoryCache, InMemoryObjectStore, NamespacedKey,
    ObjectStore,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

// ============================================================================
// CACHE DOUBLES
// ============================================================================

/// Cache whose writes never complete. Reads always miss.
#[derive(Debug, Default)]
pub struct StalledCache {
    writes_started: AtomicUsize,
}

impl StalledCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes_started(&self) -> usize {
        self.writes_started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheBackend for StalledCache {
    async fn get(&self, _key: &NamespacedKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: NamespacedKey, _payload: Vec<u8>) -> Result<(), CacheError> {
        self.writes_started.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(CacheStats::default())
    }
}

/// Cache that delays every write before storing it in an [`InMemoryCache`].
#[derive(Debug)]
pub struct SlowCache {
    inner: InMemoryCache,
    delay: Duration,
}

impl SlowCache {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryCache::new(),
            delay,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl CacheBackend for SlowCache {
    async fn get(&self, key: &NamespacedKey) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: NamespacedKey, payload: Vec<u8>) -> Result<(), CacheError> {
        tokio::time::sleep(self.delay).await;
        self.inner.set(key, payload).await
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        self.inner.stats().await
    }
}

/// Cache that fails every operation.
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &NamespacedKey) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Unavailable {
            reason: "cache offline".to_string(),
        })
    }

    async fn set(&self, _key: NamespacedKey, _payload: Vec<u8>) -> Result<(), CacheError> {
        Err(CacheError::Unavailable {
            reason: "cache offline".to_string(),
        })
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Err(CacheError::Unavailable {
            reason: "cache offline".to_string(),
        })
    }
}

// ============================================================================
// OBJECT STORE DOUBLES
// ============================================================================

/// Wraps an [`InMemoryObjectStore`] and counts authoritative calls.
#[derive(Debug, Default)]
pub struct CountingObjectStore {
    inner: InMemoryObjectStore,
    stats: AtomicUsize,
    opens: AtomicUsize,
}

impl CountingObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stat_calls(&self) -> usize {
        self.stats.load(Ordering::SeqCst)
    }

    pub fn open_calls(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for CountingObjectStore {
    async fn stat(
        &self,
        location: &ObjectLocation,
    ) -> Result<Option<ObjectAttributes>, StoreError> {
        self.stats.fetch_add(1, Ordering::SeqCst);
        self.inner.stat(location).await
    }

    async fn open(&self, location: &ObjectLocation) -> Result<BoxedAsyncRead, StoreError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open(location).await
    }

    async fn put(
        &self,
        location: &ObjectLocation,
        body: Bytes,
    ) -> Result<ObjectAttributes, StoreError> {
        self.inner.put(location, body).await
    }
}

/// How a [`FailingObjectStore`] misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// `stat` returns a backend error.
    Stat,
    /// `stat` succeeds with a timestamp that is not RFC 3339.
    BadTimestamp,
    /// `stat` succeeds but `open` returns a backend error.
    Open,
}

/// Object store that reports every object as present and then fails.
#[derive(Debug)]
pub struct FailingObjectStore {
    failure: Failure,
}

impl FailingObjectStore {
    pub fn new(failure: Failure) -> Self {
        Self { failure }
    }
}

#[async_trait]
impl ObjectStore for FailingObjectStore {
    async fn stat(
        &self,
        _location: &ObjectLocation,
    ) -> Result<Option<ObjectAttributes>, StoreError> {
        match self.failure {
            Failure::Stat => Err(StoreError::Backend {
                reason: "object store unavailable".to_string(),
            }),
            Failure::BadTimestamp => Ok(Some(ObjectAttributes {
                etag: "\"broken\"".to_string(),
                updated: "not a timestamp".to_string(),
            })),
            Failure::Open => Ok(Some(ObjectAttributes {
                etag: "\"unreadable\"".to_string(),
                updated: "2024-01-01T00:00:00Z".to_string(),
            })),
        }
    }

    async fn open(&self, _location: &ObjectLocation) -> Result<BoxedAsyncRead, StoreError> {
        Err(StoreError::Backend {
            reason: "stream unavailable".to_string(),
        })
    }

    async fn put(
        &self,
        _location: &ObjectLocation,
        _body: Bytes,
    ) -> Result<ObjectAttributes, StoreError> {
        Err(StoreError::Backend {
            reason: "read-only".to_string(),
        })
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    use proptest::prelude::*;

    /// Valid basic-auth usernames.
    pub fn arb_username() -> impl Strategy<Value = String> {
        "[A-Za-z0-9]{1,16}"
    }

    /// Passwords, including ones containing `:` (only the first colon splits).
    pub fn arb_password() -> impl Strategy<Value = String> {
        "[ -~]{0,24}"
    }

    /// Usernames with at least one disallowed character.
    pub fn arb_invalid_username() -> impl Strategy<Value = String> {
        ("[A-Za-z0-9]{0,6}", "[^A-Za-z0-9]", "[A-Za-z0-9]{0,6}")
            .prop_map(|(a, bad, b)| format!("{a}{bad}{b}"))
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    pub const ACME_HOST: &str = "acme.example";
    pub const ACME_BUCKET: &str = "site";
    pub const ALICE: &str = "alice";
    pub const ALICE_PASSWORD: &str = "wonderland";
    pub const INDEX_HTML: &[u8] = b"<!doctype html><h1>acme</h1>";

    /// `acme.example` with basic auth over in-memory storage.
    pub fn acme_domain() -> DomainRecord {
        DomainRecord::new(ACME_HOST)
            .with_auth("basic")
            .with_storage("memory", ACME_BUCKET)
    }

    pub fn acme_namespace() -> Namespace {
        Namespace::new(ACME_HOST).unwrap_or_else(|| panic!("{ACME_HOST} is a valid namespace"))
    }

    /// Location of `path` in the `acme.example` bucket.
    pub fn acme_location(path: &str) -> ObjectLocation {
        let path = ObjectPath::parse(path).unwrap_or_else(|| panic!("{path:?} is not clean"));
        ObjectLocation::new(acme_namespace(), ACME_BUCKET, path)
    }

    /// Value for an `Authorization` header: `Basic base64(user:password)`.
    pub fn basic_auth_header(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
    }

    /// An object store holding `/index.html` for `acme.example`.
    pub async fn acme_objects() -> Arc<InMemoryObjectStore> {
        let store = Arc::new(InMemoryObjectStore::new());
        let stored = store
            .put(&acme_location("/index.html"), Bytes::from_static(INDEX_HTML))
            .await;
        if let Err(e) = stored {
            panic!("in-memory put failed: {e}");
        }
        store
    }
}
