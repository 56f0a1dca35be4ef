//! Cache-fronted object stat.
//!
//! [`MetadataCache::stat`] answers "does this object exist and what version
//! is it" from the cache when it can, and from the authoritative
//! [`ObjectStore`] otherwise. Repopulating the cache after a miss costs the
//! request at most [`MetadataCache::write_timeout`]: the write runs as its
//! own task and is abandoned (not cancelled) once the wait elapses.

use std::sync::Arc;
use std::time::Duration;

use satellite_core::{ObjectLocation, ObjectMetadata, StoreError};
use tracing::{debug, trace, warn};

use super::key::NamespacedKey;
use crate::traits::{CacheBackend, ObjectStore};

/// Default bound on how long a request waits for its cache write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(5);

/// Metadata cache over a shared [`CacheBackend`].
///
/// Only positive lookups are cached and no TTL is applied here; expiry is
/// entirely the backend's business.
#[derive(Clone)]
pub struct MetadataCache {
    cache: Arc<dyn CacheBackend>,
    write_timeout: Duration,
}

impl MetadataCache {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self {
            cache,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    /// Current metadata for `location`.
    ///
    /// Returns `Ok(None)` when the object does not exist. An `Err` is a stat
    /// failure: the backend failed or reported an unparseable timestamp.
    /// Cache failures never surface here.
    pub async fn stat(
        &self,
        location: &ObjectLocation,
        store: &dyn ObjectStore,
    ) -> Result<Option<ObjectMetadata>, StoreError> {
        let key = NamespacedKey::for_stat(&location.namespace, &location.path);

        if let Some(metadata) = self.lookup(&key).await {
            trace!(key = %key, "stat cache hit");
            return Ok(Some(metadata));
        }

        let Some(attributes) = store.stat(location).await? else {
            return Ok(None);
        };
        let metadata = attributes.into_metadata(&location.path)?;

        self.populate(key, &metadata).await;
        Ok(Some(metadata))
    }

    async fn lookup(&self, key: &NamespacedKey) -> Option<ObjectMetadata> {
        let payload = match self.cache.get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "stat cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&payload) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(key = %key, error = %e, "malformed stat cache entry, treating as miss");
                None
            }
        }
    }

    async fn populate(&self, key: NamespacedKey, metadata: &ObjectMetadata) {
        let payload = match serde_json::to_vec(metadata) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode stat cache entry");
                return;
            }
        };

        let cache = Arc::clone(&self.cache);
        let label = key.to_string();
        let handle = tokio::spawn(async move { cache.set(key, payload).await });

        // Dropping the handle on timeout detaches the write; it may still land.
        match tokio::time::timeout(self.write_timeout, handle).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!(key = %label, error = %e, "stat cache write failed"),
            Ok(Err(e)) => warn!(key = %label, error = %e, "stat cache write task failed"),
            Err(_) => debug!(
                key = %label,
                timeout_ms = self.write_timeout.as_millis() as u64,
                "stat cache write still pending, continuing without it"
            ),
        }
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("write_timeout", &self.write_timeout)
            .finish_non_exhaustive()
    }
}
