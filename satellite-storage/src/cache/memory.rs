//! Process-local cache backend.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use satellite_core::CacheError;

use super::key::NamespacedKey;
use crate::traits::{CacheBackend, CacheStats};

/// Unbounded in-memory [`CacheBackend`]. Entries live until the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<NamespacedKey, Vec<u8>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &NamespacedKey) -> Result<Option<Vec<u8>>, CacheError> {
        let found = self.entries.get(key).map(|entry| entry.value().clone());
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(found)
    }

    async fn set(&self, key: NamespacedKey, payload: Vec<u8>) -> Result<(), CacheError> {
        self.entries.insert(key, payload);
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let memory_bytes = self
            .entries
            .iter()
            .map(|entry| (entry.key().encode().len() + entry.value().len()) as u64)
            .sum();
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
            memory_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satellite_core::{Namespace, ObjectPath};

    fn key(path: &str) -> NamespacedKey {
        let ns = Namespace::new("acme.example").expect("valid namespace");
        NamespacedKey::for_stat(&ns, &ObjectPath::parse(path).expect("valid path"))
    }

    #[tokio::test]
    async fn test_get_set_and_stats() -> Result<(), CacheError> {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get(&key("/a")).await?, None);

        cache.set(key("/a"), b"payload".to_vec()).await?;
        assert_eq!(cache.get(&key("/a")).await?, Some(b"payload".to_vec()));

        let stats = cache.stats().await?;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_overwrites() -> Result<(), CacheError> {
        let cache = InMemoryCache::new();
        cache.set(key("/a"), b"one".to_vec()).await?;
        cache.set(key("/a"), b"two".to_vec()).await?;
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("/a")).await?, Some(b"two".to_vec()));
        Ok(())
    }
}
