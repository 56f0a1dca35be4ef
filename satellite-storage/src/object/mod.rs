//! Reference [`ObjectStore`](crate::traits::ObjectStore) implementations.

pub mod fs;
pub mod memory;

pub use fs::{validate_bucket, FsObjectStore};
pub use memory::{content_etag, InMemoryObjectStore};
