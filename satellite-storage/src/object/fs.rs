//! Filesystem object store.
//!
//! Layout: `<root>/<namespace>/<bucket>/<object key>`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use satellite_core::{ObjectAttributes, ObjectLocation, StoreError};
use tokio::fs;

use crate::traits::{BoxedAsyncRead, ObjectStore};

pub const MAX_BUCKET_LEN: usize = 63;

/// [`ObjectStore`] over a local directory tree.
///
/// Entity tags are derived from size and mtime, so they change whenever the
/// file is rewritten (subject to the filesystem's mtime resolution).
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, location: &ObjectLocation) -> Result<PathBuf, StoreError> {
        validate_bucket(&location.bucket)?;
        let mut path = self
            .root
            .join(location.namespace.as_str())
            .join(&location.bucket);
        for segment in location.path.object_key().split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        Ok(path)
    }
}

/// Bucket names become a directory component: `[A-Za-z0-9._-]`, no `.`/`..`.
pub fn validate_bucket(bucket: &str) -> Result<(), StoreError> {
    let valid = !bucket.is_empty()
        && bucket.len() <= MAX_BUCKET_LEN
        && bucket != "."
        && bucket != ".."
        && bucket
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidBucket {
            bucket: bucket.to_string(),
        })
    }
}

fn etag_from_size_and_mtime(size: u64, mtime: Option<SystemTime>) -> String {
    let (sec, nsec) = mtime
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| (d.as_secs(), d.subsec_nanos()))
        .unwrap_or((0, 0));
    format!("\"{size:x}-{sec:x}-{nsec:x}\"")
}

fn attributes_of(meta: &std::fs::Metadata) -> ObjectAttributes {
    let mtime = meta.modified().ok();
    let updated: DateTime<Utc> = mtime.map(DateTime::<Utc>::from).unwrap_or_default();
    ObjectAttributes {
        etag: etag_from_size_and_mtime(meta.len(), mtime),
        updated: updated.to_rfc3339_opts(SecondsFormat::Nanos, true),
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn stat(
        &self,
        location: &ObjectLocation,
    ) -> Result<Option<ObjectAttributes>, StoreError> {
        let path = self.resolve(location)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(attributes_of(&meta))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn open(&self, location: &ObjectLocation) -> Result<BoxedAsyncRead, StoreError> {
        let path = self.resolve(location)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::NotFound {
                    path: location.path.to_string(),
                }
            } else {
                StoreError::Io(e)
            }
        })?;
        Ok(Box::pin(file))
    }

    async fn put(
        &self,
        location: &ObjectLocation,
        body: Bytes,
    ) -> Result<ObjectAttributes, StoreError> {
        let path = self.resolve(location)?;
        if location.path.object_key().is_empty() {
            return Err(StoreError::Backend {
                reason: "cannot write an object at the bucket root".to_string(),
            });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &body).await?;
        let meta = fs::metadata(&path).await?;
        Ok(attributes_of(&meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satellite_core::{Namespace, ObjectPath};
    use tokio::io::AsyncReadExt;

    fn location(bucket: &str, path: &str) -> ObjectLocation {
        ObjectLocation::new(
            Namespace::new("acme.example").expect("valid namespace"),
            bucket,
            ObjectPath::parse(path).expect("valid path"),
        )
    }

    #[test]
    fn test_bucket_validation() {
        assert!(validate_bucket("site").is_ok());
        assert!(validate_bucket("my-site_v2.prod").is_ok());
        for bad in ["", ".", "..", "a/b", "a b", "a\\b"] {
            assert!(
                matches!(validate_bucket(bad), Err(StoreError::InvalidBucket { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_put_stat_open_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = FsObjectStore::new(dir.path());
        let loc = location("site", "/docs/index.html");

        let attrs = store.put(&loc, Bytes::from_static(b"<p>docs</p>")).await?;
        assert!(dir
            .path()
            .join("acme.example/site/docs/index.html")
            .is_file());

        let stat = store.stat(&loc).await?.expect("object exists");
        assert_eq!(stat, attrs);
        assert!(DateTime::parse_from_rfc3339(&stat.updated).is_ok());

        let mut body = String::new();
        store.open(&loc).await?.read_to_string(&mut body).await?;
        assert_eq!(body, "<p>docs</p>");
        Ok(())
    }

    #[tokio::test]
    async fn test_directories_and_missing_files_are_absent() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        let store = FsObjectStore::new(dir.path());
        store
            .put(&location("site", "/docs/index.html"), Bytes::from_static(b"x"))
            .await?;

        assert_eq!(store.stat(&location("site", "/docs")).await?, None);
        assert_eq!(store.stat(&location("site", "/nope.css")).await?, None);
        assert!(matches!(
            store.open(&location("site", "/nope.css")).await,
            Err(StoreError::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_bucket_is_an_error_not_a_miss() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsObjectStore::new(dir.path());
        let result = store.stat(&location("..", "/index.html")).await;
        assert!(matches!(result, Err(StoreError::InvalidBucket { .. })));
    }
}
