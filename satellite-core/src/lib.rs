//! Satellite Core - Shared Types
//!
//! Identity types, object metadata, tenant records and the error taxonomy
//! shared by the storage backends and the HTTP serving layer.

pub mod error;
pub mod identity;
pub mod metadata;
pub mod tenant;

pub use error::{CacheError, CredentialError, StoreError, TenantError};
pub use identity::{Namespace, ObjectLocation, ObjectPath, Username};
pub use metadata::{ObjectAttributes, ObjectMetadata};
pub use tenant::{AuthKind, AuthSettings, DomainRecord, StorageKind, StorageSettings};
