//! Object version metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::identity::ObjectPath;

/// Version metadata for a stored object.
///
/// The entity tag is opaque and backend-assigned; it changes iff the
/// underlying content changes. This is also the cache payload format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub etag: String,
    pub modified: DateTime<Utc>,
}

/// Live object attributes as reported by an authoritative object store.
///
/// `updated` is the backend's RFC 3339 timestamp, kept as text so that
/// parsing failures surface as stat failures rather than backend quirks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAttributes {
    pub etag: String,
    pub updated: String,
}

impl ObjectAttributes {
    /// Parse the backend timestamp into [`ObjectMetadata`].
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidTimestamp`] if `updated` is not RFC 3339.
    pub fn into_metadata(self, path: &ObjectPath) -> Result<ObjectMetadata, StoreError> {
        let modified = DateTime::parse_from_rfc3339(&self.updated)
            .map_err(|_| StoreError::InvalidTimestamp {
                path: path.to_string(),
                value: self.updated.clone(),
            })?
            .with_timezone(&Utc);

        Ok(ObjectMetadata {
            etag: self.etag,
            modified,
        })
    }
}
