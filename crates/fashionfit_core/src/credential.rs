//! Password hashing collaborator.
//!
//! # Responsibility
//! - Define the one-way hashing contract used by user registration and login.
//! - Provide the default Argon2id implementation (PHC string output).
//!
//! # Invariants
//! - Plaintext passwords never leave the `hash`/`verify` call.
//! - `verify` returns `Ok(false)` on mismatch; errors are reserved for
//!   backend failures and unparseable stored hashes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error raised by a hashing backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Backend could not produce a hash.
    Backend(String),
    /// Stored hash is not in a format the backend understands.
    MalformedHash(String),
}

impl Display for HashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(message) => write!(f, "password hashing failed: {message}"),
            Self::MalformedHash(message) => write!(f, "stored password hash is malformed: {message}"),
        }
    }
}

impl Error for HashError {}

/// One-way credential hashing contract.
pub trait CredentialHasher: Send + Sync {
    /// Hashes plaintext into an opaque, self-describing string.
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;
    /// Checks plaintext against a value previously produced by `hash`.
    fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, HashError>;
}

/// Argon2id hasher with library default cost parameters.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| HashError::Backend(err.to_string()))
    }

    fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, HashError> {
        let parsed =
            PasswordHash::new(hashed).map_err(|err| HashError::MalformedHash(err.to_string()))?;
        Ok(self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}
