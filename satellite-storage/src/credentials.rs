//! In-memory credential store.

use async_trait::async_trait;
use dashmap::DashMap;
use satellite_core::{Namespace, StoreError, Username};

use crate::traits::{CredentialStore, StoredCredential};

/// [`CredentialStore`] keyed by `(namespace, username)`.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    credentials: DashMap<(Namespace, Username), StoredCredential>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of credentials stored for `namespace`.
    pub fn count(&self, namespace: &Namespace) -> usize {
        self.credentials
            .iter()
            .filter(|entry| &entry.key().0 == namespace)
            .count()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(
        &self,
        namespace: &Namespace,
        username: &Username,
    ) -> Result<Option<StoredCredential>, StoreError> {
        let key = (namespace.clone(), username.clone());
        Ok(self.credentials.get(&key).map(|entry| entry.value().clone()))
    }

    async fn put(
        &self,
        namespace: &Namespace,
        credential: StoredCredential,
    ) -> Result<(), StoreError> {
        let key = (namespace.clone(), credential.username.clone());
        self.credentials.insert(key, credential);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(user: &str, hash: &str) -> StoredCredential {
        StoredCredential {
            username: Username::parse(user).expect("valid username"),
            password_hash: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn test_put_overwrites_within_namespace() -> Result<(), StoreError> {
        let store = InMemoryCredentialStore::new();
        let ns = Namespace::new("acme.example").expect("valid namespace");
        store.put(&ns, credential("alice", "h1")).await?;
        store.put(&ns, credential("alice", "h2")).await?;

        let alice = Username::parse("alice").expect("valid username");
        let stored = store.get(&ns, &alice).await?.expect("stored");
        assert_eq!(stored.password_hash, "h2");
        assert_eq!(store.count(&ns), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() -> Result<(), StoreError> {
        let store = InMemoryCredentialStore::new();
        let acme = Namespace::new("acme.example").expect("valid namespace");
        let other = Namespace::new("other.example").expect("valid namespace");
        store.put(&acme, credential("alice", "h1")).await?;

        let alice = Username::parse("alice").expect("valid username");
        assert!(store.get(&other, &alice).await?.is_none());
        Ok(())
    }

    #[test]
    fn test_debug_redacts_hash() {
        let rendered = format!("{:?}", credential("alice", "$argon2id$secret"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("alice"));
    }
}
