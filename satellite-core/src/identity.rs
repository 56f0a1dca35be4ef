//! Identity types: tenant namespaces, usernames and object paths.
//!
//! Every backend call made on behalf of a tenant carries a [`Namespace`]
//! explicitly, so identical object paths or usernames in two tenants can
//! never collide.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// Maximum length of a namespace (host names are capped at 253 by DNS).
pub const MAX_NAMESPACE_LEN: usize = 253;

// Anchored: the whole username must be alphanumeric, not just a substring.
static USERNAME_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").ok());

// ============================================================================
// NAMESPACE
// ============================================================================

/// Isolation boundary for one tenant's backend data.
///
/// Derived from the tenant's canonical host name. Restricted to
/// `[a-z0-9._-]` so it can double as a directory component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    /// Build a namespace from a tenant name. Returns `None` for names that
    /// are empty, too long, `.`/`..`, or contain disallowed characters.
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() || name.len() > MAX_NAMESPACE_LEN || name == "." || name == ".." {
            return None;
        }
        let allowed = name
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_'));
        allowed.then_some(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// USERNAME
// ============================================================================

/// A validated basic-auth username (`[A-Za-z0-9]+`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate a raw username.
    ///
    /// # Errors
    /// Returns [`CredentialError::InvalidIdentifier`] if the username is empty
    /// or contains any character outside `[A-Za-z0-9]`.
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let valid = USERNAME_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(raw));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(CredentialError::InvalidIdentifier {
                username: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// OBJECT PATH
// ============================================================================

/// A cleaned, absolute object path within a tenant's storage namespace.
///
/// Always starts with `/`, never contains empty, `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Clean an already percent-decoded request path.
    ///
    /// Repeated and trailing slashes collapse. Returns `None` for relative
    /// paths and for paths containing `.`/`..` segments, NUL or backslash.
    pub fn parse(raw: &str) -> Option<Self> {
        if !raw.starts_with('/') || raw.contains('\0') || raw.contains('\\') {
            return None;
        }

        let mut cleaned = String::with_capacity(raw.len());
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return None;
            }
            cleaned.push('/');
            cleaned.push_str(segment);
        }

        if cleaned.is_empty() {
            cleaned.push('/');
        }
        Some(Self(cleaned))
    }

    /// The root path `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment, or `""` for the root.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Extension of the final segment without the dot (`"png"` for
    /// `/img/logo.png`), or `None` when the final segment has no dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rfind('.').map(|idx| &name[idx + 1..])
    }

    /// Append a single segment, e.g. `index.html`.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.trim_matches('/');
        if self.0 == "/" {
            Self(format!("/{segment}"))
        } else {
            Self(format!("{}/{segment}", self.0))
        }
    }

    /// The object key as a blob store sees it: the path without its leading
    /// slash (`/index.html` -> `index.html`).
    pub fn object_key(&self) -> &str {
        &self.0[1..]
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// OBJECT LOCATION
// ============================================================================

/// Fully qualified address of an object: tenant namespace, bucket and path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub namespace: Namespace,
    pub bucket: String,
    pub path: ObjectPath,
}

impl ObjectLocation {
    pub fn new(namespace: Namespace, bucket: impl Into<String>, path: ObjectPath) -> Self {
        Self {
            namespace,
            bucket: bucket.into(),
            path,
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}{}", self.namespace, self.bucket, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_namespace_normalizes_case() {
        let ns = Namespace::new("Acme.Example").expect("valid namespace");
        assert_eq!(ns.as_str(), "acme.example");
    }

    #[test]
    fn test_namespace_rejects_traversal_and_separators() {
        assert!(Namespace::new("").is_none());
        assert!(Namespace::new("..").is_none());
        assert!(Namespace::new("acme/example").is_none());
        assert!(Namespace::new("acme example").is_none());
    }

    #[test]
    fn test_username_accepts_alphanumeric() -> Result<(), CredentialError> {
        assert_eq!(Username::parse("alice")?.as_str(), "alice");
        assert_eq!(Username::parse("Bob42")?.as_str(), "Bob42");
        Ok(())
    }

    #[test]
    fn test_username_rejects_partial_matches() {
        // An unanchored pattern would accept these because they contain
        // an alphanumeric run.
        for bad in ["al ice", "alice!", "-alice", "alice:x", ""] {
            assert!(
                matches!(
                    Username::parse(bad),
                    Err(CredentialError::InvalidIdentifier { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_username_deserialize_validates() {
        let ok: Result<Username, _> = serde_json::from_str("\"alice\"");
        assert!(ok.is_ok());
        let bad: Result<Username, _> = serde_json::from_str("\"al/ice\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_object_path_cleaning() {
        assert_eq!(ObjectPath::parse("/").map(|p| p.0), Some("/".to_string()));
        assert_eq!(
            ObjectPath::parse("//docs///intro/").map(|p| p.0),
            Some("/docs/intro".to_string())
        );
        assert!(ObjectPath::parse("relative").is_none());
        assert!(ObjectPath::parse("/a/../b").is_none());
        assert!(ObjectPath::parse("/a/./b").is_none());
        assert!(ObjectPath::parse("/a\\b").is_none());
    }

    #[test]
    fn test_object_path_extension_uses_final_segment() {
        let p = ObjectPath::parse("/v1.2/readme").expect("valid path");
        assert_eq!(p.extension(), None);

        let p = ObjectPath::parse("/img/logo.png").expect("valid path");
        assert_eq!(p.extension(), Some("png"));

        let p = ObjectPath::parse("/archive.tar.gz").expect("valid path");
        assert_eq!(p.extension(), Some("gz"));
    }

    #[test]
    fn test_object_path_join_and_key() {
        let root = ObjectPath::root();
        assert_eq!(root.join("index.html").as_str(), "/index.html");

        let docs = ObjectPath::parse("/docs").expect("valid path");
        let index = docs.join("index.html");
        assert_eq!(index.as_str(), "/docs/index.html");
        assert_eq!(index.object_key(), "docs/index.html");
    }

    proptest! {
        #[test]
        fn prop_non_alphanumeric_usernames_rejected(
            prefix in "[A-Za-z0-9]{0,8}",
            bad in "[^A-Za-z0-9]",
            suffix in "[A-Za-z0-9]{0,8}",
        ) {
            let raw = format!("{prefix}{bad}{suffix}");
            let rejected = matches!(
                Username::parse(&raw),
                Err(CredentialError::InvalidIdentifier { .. })
            );
            prop_assert!(rejected);
        }

        #[test]
        fn prop_cleaned_paths_are_stable(raw in "(/[a-z0-9._-]{0,6}){0,5}") {
            if let Some(once) = ObjectPath::parse(&raw) {
                let twice = ObjectPath::parse(once.as_str());
                prop_assert_eq!(Some(once), twice);
            }
        }
    }
}
