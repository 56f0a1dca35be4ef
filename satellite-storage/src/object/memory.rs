//! Process-local object store.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use satellite_core::{ObjectAttributes, ObjectLocation, StoreError};
use sha2::{Digest, Sha256};

use crate::traits::{BoxedAsyncRead, ObjectStore};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    etag: String,
    updated: DateTime<Utc>,
}

impl StoredObject {
    fn attributes(&self) -> ObjectAttributes {
        ObjectAttributes {
            etag: self.etag.clone(),
            updated: self.updated.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// [`ObjectStore`] backed by a concurrent map.
///
/// Entity tags are the quoted hex SHA-256 of the content, so rewriting an
/// object with identical bytes keeps its tag.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<ObjectLocation, StoredObject>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Quoted hex SHA-256 of `body`.
pub fn content_etag(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn stat(
        &self,
        location: &ObjectLocation,
    ) -> Result<Option<ObjectAttributes>, StoreError> {
        Ok(self.objects.get(location).map(|obj| obj.attributes()))
    }

    async fn open(&self, location: &ObjectLocation) -> Result<BoxedAsyncRead, StoreError> {
        let body = self
            .objects
            .get(location)
            .map(|obj| obj.body.clone())
            .ok_or_else(|| StoreError::NotFound {
                path: location.path.to_string(),
            })?;
        Ok(Box::pin(Cursor::new(body)))
    }

    async fn put(
        &self,
        location: &ObjectLocation,
        body: Bytes,
    ) -> Result<ObjectAttributes, StoreError> {
        let etag = content_etag(&body);
        let updated = match self.objects.get(location) {
            Some(existing) if existing.etag == etag => existing.updated,
            _ => Utc::now(),
        };
        let object = StoredObject {
            body,
            etag,
            updated,
        };
        let attributes = object.attributes();
        self.objects.insert(location.clone(), object);
        Ok(attributes)
    }
}
