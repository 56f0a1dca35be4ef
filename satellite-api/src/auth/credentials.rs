//! Credential management and verification.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use satellite_core::{CredentialError, Namespace, Username};
use satellite_storage::{CredentialStore, StoredCredential};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::password::PasswordHasher;

/// Adds and verifies basic-auth credentials within a tenant namespace.
///
/// Hashing and verification run on the blocking pool.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    /// Hash checked when no stored credential applies, so misses cost the
    /// same as mismatches. Built on first use.
    decoy_hash: Arc<OnceCell<Option<String>>>,
}

/// Password behind the decoy hash. Never matches a request on its own
/// because miss paths always answer `false`.
const DECOY_PASSWORD: &str = "satellite-decoy-credential";

impl CredentialService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            store,
            hasher,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Validate `username`, hash `password` and store the pair, replacing
    /// any existing credential for that user.
    ///
    /// # Errors
    /// [`CredentialError::InvalidIdentifier`] for a malformed username; in
    /// that case nothing is hashed or written.
    pub async fn add_user(
        &self,
        namespace: &Namespace,
        username: &str,
        password: SecretString,
    ) -> Result<(), CredentialError> {
        let username = Username::parse(username)?;

        let hasher = Arc::clone(&self.hasher);
        let password_hash =
            tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret()))
                .await
                .map_err(|e| CredentialError::Hashing {
                    reason: e.to_string(),
                })??;

        self.store
            .put(
                namespace,
                StoredCredential {
                    username: username.clone(),
                    password_hash,
                },
            )
            .await?;

        debug!(namespace = %namespace, username = %username, "credential stored");
        Ok(())
    }

    /// Whether `password` is correct for `username`.
    ///
    /// Unknown users, malformed usernames, store failures and hash mismatches
    /// all yield `false`. Every path runs one hash verification.
    pub async fn verify(&self, namespace: &Namespace, username: &str, password: &str) -> bool {
        let Ok(username) = Username::parse(username) else {
            self.verify_decoy(password).await;
            return false;
        };

        let stored = match self.store.get(namespace, &username).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                self.verify_decoy(password).await;
                return false;
            }
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "credential lookup failed");
                self.verify_decoy(password).await;
                return false;
            }
        };

        let hasher = Arc::clone(&self.hasher);
        let password = SecretString::from(password.to_string());
        tokio::task::spawn_blocking(move || {
            hasher.verify(password.expose_secret(), &stored.password_hash)
        })
        .await
        .unwrap_or(false)
    }

    /// Spend one verification against the decoy hash. The outcome is
    /// discarded.
    async fn verify_decoy(&self, password: &str) {
        let hasher = Arc::clone(&self.hasher);
        let decoy = Arc::clone(&self.decoy_hash);
        let password = SecretString::from(password.to_string());
        let outcome = tokio::task::spawn_blocking(move || {
            let hash = decoy.get_or_init(|| hasher.hash(DECOY_PASSWORD).ok());
            match hash {
                Some(hash) => {
                    hasher.verify(password.expose_secret(), hash);
                }
                None => warn!("decoy credential hash unavailable"),
            }
        })
        .await;
        if let Err(e) = outcome {
            warn!(error = %e, "decoy verification task failed");
        }
    }
}
