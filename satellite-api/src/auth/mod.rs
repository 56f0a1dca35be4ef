//! Authentication for the file-serving path.
//!
//! - [`password`]: one-way hashing with a tunable work factor
//! - [`credentials`]: per-namespace user management on top of a `CredentialStore`
//! - [`gate`]: the per-tenant [`Authenticator`] consulted on every request

pub mod credentials;
pub mod gate;
pub mod password;

pub use credentials::CredentialService;
pub use gate::{basic_challenge, parse_basic_authorization, AllowAll, Authenticator, BasicAuthenticator};
pub use password::{Argon2Hasher, HashCost, PasswordHasher};
