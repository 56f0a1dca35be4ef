//! Request authorization.
//!
//! A tenant's auth policy resolves to one [`Authenticator`]. The serving path
//! only ever asks it a yes/no question, so adding a policy means adding an
//! implementation here and a variant to `AuthKind`.

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64::{engine::general_purpose::STANDARD, Engine};
use satellite_core::Namespace;

use super::credentials::CredentialService;

const BASIC_PREFIX: &str = "Basic ";

/// Decides whether a request may proceed.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn is_authorized(&self, headers: &HeaderMap) -> bool;
}

/// Authorizes every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authenticator for AllowAll {
    async fn is_authorized(&self, _headers: &HeaderMap) -> bool {
        true
    }
}

/// HTTP basic auth against one tenant's credential namespace.
#[derive(Clone)]
pub struct BasicAuthenticator {
    namespace: Namespace,
    credentials: CredentialService,
}

impl BasicAuthenticator {
    pub fn new(namespace: Namespace, credentials: CredentialService) -> Self {
        Self {
            namespace,
            credentials,
        }
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let Some((username, password)) = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic_authorization)
        else {
            return false;
        };
        self.credentials
            .verify(&self.namespace, &username, &password)
            .await
    }
}

/// Split a `Basic <base64(user:pass)>` header value into its parts.
///
/// Returns `None` for any other scheme, invalid base64, non UTF-8 payloads
/// and payloads without a `:`. The password may itself contain colons.
pub fn parse_basic_authorization(value: &str) -> Option<(String, String)> {
    let encoded = value.strip_prefix(BASIC_PREFIX)?.trim();
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// `WWW-Authenticate` value for a basic challenge.
pub fn basic_challenge(realm: &str) -> String {
    format!("Basic realm=\"{}\"", realm.replace(['"', '\\'], ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use satellite_test_utils::fixtures::basic_auth_header;

    #[test]
    fn test_parse_basic() {
        let header = basic_auth_header("alice", "wonderland");
        assert_eq!(
            parse_basic_authorization(&header),
            Some(("alice".to_string(), "wonderland".to_string()))
        );
    }

    #[test]
    fn test_password_keeps_later_colons() {
        let header = basic_auth_header("alice", "a:b:c");
        assert_eq!(
            parse_basic_authorization(&header),
            Some(("alice".to_string(), "a:b:c".to_string()))
        );
    }

    #[test]
    fn test_parse_fails_closed() {
        // Wrong scheme.
        assert_eq!(parse_basic_authorization("Bearer abc"), None);
        // Not base64.
        assert_eq!(parse_basic_authorization("Basic !!!"), None);
        // No colon: base64("alice").
        assert_eq!(parse_basic_authorization("Basic YWxpY2U="), None);
        // Invalid UTF-8: base64([0xff, 0x3a]).
        assert_eq!(parse_basic_authorization("Basic /zo="), None);
        assert_eq!(parse_basic_authorization(""), None);
    }

    #[test]
    fn test_challenge_format() {
        assert_eq!(basic_challenge("Private"), "Basic realm=\"Private\"");
        assert_eq!(basic_challenge("a\"b"), "Basic realm=\"ab\"");
    }

    #[tokio::test]
    async fn test_allow_all() {
        assert!(AllowAll.is_authorized(&HeaderMap::new()).await);
    }
}
