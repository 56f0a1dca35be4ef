//! Satellite Storage - Backend Traits and Reference Backends
//!
//! Defines the collaborator traits the serving layer consumes (cache, object
//! store, credential store, tenant store), in-process implementations of each,
//! and the [`MetadataCache`] that fronts object stats with a bounded-wait
//! cache write.

pub mod cache;
pub mod credentials;
pub mod object;
pub mod tenants;
pub mod traits;

pub use cache::{InMemoryCache, MetadataCache, NamespacedKey, DEFAULT_WRITE_TIMEOUT};
pub use credentials::InMemoryCredentialStore;
pub use object::{FsObjectStore, InMemoryObjectStore};
pub use tenants::InMemoryTenantStore;
pub use traits::{
    BoxedAsyncRead, CacheBackend, CacheStats, CredentialStore, ObjectStore, StoredCredential,
    TenantStore,
};
