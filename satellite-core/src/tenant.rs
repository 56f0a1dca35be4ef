//! Tenant (domain) records and their policy kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::identity::Namespace;

/// A tenant's stored configuration, keyed by its canonical host name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Canonical host name.
    pub name: String,
    /// Additional host names that resolve to this tenant and share its namespace.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl DomainRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            aliases: Vec::new(),
            auth: AuthSettings::default(),
            storage: StorageSettings::default(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_ascii_lowercase());
        self
    }

    pub fn with_auth(mut self, kind: impl Into<String>) -> Self {
        self.auth = AuthSettings { kind: kind.into() };
        self
    }

    pub fn with_storage(mut self, kind: impl Into<String>, bucket: impl Into<String>) -> Self {
        self.storage = StorageSettings {
            kind: kind.into(),
            bucket: bucket.into(),
        };
        self
    }

    /// Namespace derived from the canonical name. Aliases never get their own.
    pub fn namespace(&self) -> Option<Namespace> {
        Namespace::new(&self.name)
    }

    /// Canonical name followed by every alias.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Authentication policy as stored. `kind` is free text until resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Storage policy as stored. `kind` is free text until resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub bucket: String,
}

// ============================================================================
// POLICY KINDS
// ============================================================================

/// Unrecognized policy type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

/// Closed set of authentication policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthKind {
    /// Every request is authorized.
    None,
    /// HTTP basic auth against the tenant's credential namespace.
    Basic,
}

impl AuthKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthKind::None => "none",
            AuthKind::Basic => "basic",
        }
    }
}

impl FromStr for AuthKind {
    type Err = UnknownKind;

    /// An empty string means no policy was set and maps to [`AuthKind::None`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(AuthKind::None),
            "basic" => Ok(AuthKind::Basic),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Process-local object store.
    Memory,
    /// Directory tree under the configured storage root.
    Fs,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Memory => "memory",
            StorageKind::Fs => "fs",
        }
    }
}

impl FromStr for StorageKind {
    type Err = UnknownKind;

    /// Unlike auth, an empty storage kind is not a valid policy.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "fs" => Ok(StorageKind::Fs),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
