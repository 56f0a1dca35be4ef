//! Server Configuration Module
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for local development.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::auth::password::HashCost;
use crate::error::{ApiError, ApiResult};

/// Realm sent in `WWW-Authenticate` challenges unless overridden.
pub const DEFAULT_AUTH_REALM: &str = "Please enter a username and password";

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

#[derive(Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind: String,

    pub port: u16,

    /// Upper bound a request waits for its stat cache write.
    pub cache_write_timeout: Duration,

    /// Work factor for newly hashed passwords.
    pub hash_cost: HashCost,

    /// Root directory for tenants using `fs` storage.
    pub storage_root: PathBuf,

    /// Keys accepted in `X-API-Key` for admin RPCs. Empty disables admin RPCs.
    pub admin_keys: Vec<SecretString>,

    /// Optional JSON file applied at startup.
    pub bootstrap_path: Option<PathBuf>,

    pub auth_realm: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            cache_write_timeout: satellite_storage::DEFAULT_WRITE_TIMEOUT,
            hash_cost: HashCost::default(),
            storage_root: PathBuf::from("./data"),
            admin_keys: Vec::new(),
            bootstrap_path: None,
            auth_realm: DEFAULT_AUTH_REALM.to_string(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("cache_write_timeout", &self.cache_write_timeout)
            .field("hash_cost", &self.hash_cost)
            .field("storage_root", &self.storage_root)
            .field("admin_keys", &format!("[{} keys]", self.admin_keys.len()))
            .field("bootstrap_path", &self.bootstrap_path)
            .field("auth_realm", &self.auth_realm)
            .finish()
    }
}

impl ServerConfig {
    /// Create ServerConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SATELLITE_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` / `SATELLITE_PORT`: Listen port (default: 8080)
    /// - `SATELLITE_CACHE_WRITE_TIMEOUT_MS`: Stat cache write wait (default: 5)
    /// - `SATELLITE_HASH_COST`: Argon2 iterations for new passwords (default: 2)
    /// - `SATELLITE_STORAGE_ROOT`: Root for `fs` storage (default: ./data)
    /// - `SATELLITE_ADMIN_KEYS`: Comma-separated admin API keys (default: none)
    /// - `SATELLITE_BOOTSTRAP`: Path to a bootstrap JSON file (default: none)
    /// - `SATELLITE_AUTH_REALM`: Basic auth realm
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind = std::env::var("SATELLITE_BIND").unwrap_or(defaults.bind);

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("SATELLITE_PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let cache_write_timeout = std::env::var("SATELLITE_CACHE_WRITE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.cache_write_timeout);

        let hash_cost = std::env::var("SATELLITE_HASH_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(|iterations| HashCost {
                iterations,
                ..defaults.hash_cost
            })
            .filter(|cost| {
                let valid = cost.is_valid();
                if !valid {
                    tracing::warn!(
                        iterations = cost.iterations,
                        "SATELLITE_HASH_COST rejected by argon2, using default"
                    );
                }
                valid
            })
            .unwrap_or(defaults.hash_cost);

        let storage_root = std::env::var("SATELLITE_STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_root);

        let admin_keys = std::env::var("SATELLITE_ADMIN_KEYS")
            .ok()
            .map(|s| parse_admin_keys(&s))
            .unwrap_or_default();

        let bootstrap_path = std::env::var("SATELLITE_BOOTSTRAP")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let auth_realm = std::env::var("SATELLITE_AUTH_REALM").unwrap_or(defaults.auth_realm);

        Self {
            bind,
            port,
            cache_write_timeout,
            hash_cost,
            storage_root,
            admin_keys,
            bootstrap_path,
            auth_realm,
        }
    }

    pub fn with_cache_write_timeout(mut self, timeout: Duration) -> Self {
        self.cache_write_timeout = timeout;
        self
    }

    pub fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_keys.push(SecretString::from(key.into()));
        self
    }

    pub fn with_auth_realm(mut self, realm: impl Into<String>) -> Self {
        self.auth_realm = realm.into();
        self
    }

    /// Whether admin RPCs are reachable at all.
    pub fn admin_enabled(&self) -> bool {
        !self.admin_keys.is_empty()
    }

    /// Constant-time comparison against every configured key.
    pub fn is_valid_admin_key(&self, candidate: &str) -> bool {
        self.admin_keys.iter().fold(false, |found, key| {
            let matches: bool = key
                .expose_secret()
                .as_bytes()
                .ct_eq(candidate.as_bytes())
                .into();
            found | matches
        })
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }
}

fn parse_admin_keys(raw: &str) -> Vec<SecretString> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| SecretString::from(k.to_string()))
        .collect()
}
