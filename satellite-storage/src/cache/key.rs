//! Namespace-scoped cache keys.
//!
//! A [`NamespacedKey`] can only be built from a [`Namespace`], so a cache
//! lookup without a tenant does not compile.

use std::fmt;

use satellite_core::{Namespace, ObjectPath};

/// Prefix for object stat entries.
pub const STAT_PREFIX: &str = "stat:";

/// A cache key scoped to one tenant namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedKey {
    inner: KeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeyInner {
    namespace: Namespace,
    key: String,
}

impl NamespacedKey {
    /// Key for the stat entry of `path`: `stat:<path>`.
    pub fn for_stat(namespace: &Namespace, path: &ObjectPath) -> Self {
        Self {
            inner: KeyInner {
                namespace: namespace.clone(),
                key: format!("{STAT_PREFIX}{path}"),
            },
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    /// The key within the namespace, e.g. `stat:/index.html`.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Flat string form for backends with a single keyspace.
    ///
    /// Namespaces never contain `/`, so the first `/` always separates the
    /// namespace from the key.
    pub fn encode(&self) -> String {
        format!("{}/{}", self.inner.namespace, self.inner.key)
    }
}

impl fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
