//! Metadata caching.
//!
//! The cache is an optimization, never the source of truth: a failed read is
//! a miss, a failed or slow write is logged and forgotten, and a malformed
//! payload is ignored and overwritten on the next miss.
//!
//! Keys are [`NamespacedKey`]s, which cannot be constructed without a tenant
//! [`Namespace`](satellite_core::Namespace).

pub mod key;
pub mod memory;
pub mod metadata;

pub use key::{NamespacedKey, STAT_PREFIX};
pub use memory::InMemoryCache;
pub use metadata::{MetadataCache, DEFAULT_WRITE_TIMEOUT};
