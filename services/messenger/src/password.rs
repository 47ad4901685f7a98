//! Password hashing and verification

use anyhow::Result;
use argon2::{
    Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};

/// Hashes passwords and checks them against stored digests
pub trait CredentialVerifier: Send + Sync {
    /// Hash a plaintext password with a fresh random salt
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// Check a plaintext password against a stored digest
    ///
    /// Returns `Ok(false)` on mismatch. A digest that cannot be parsed is an
    /// error: it means the stored record is corrupt, not that the caller
    /// typed the wrong password.
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool>;
}

/// Argon2id credential verifier
#[derive(Clone, Default)]
pub struct Argon2Verifier {
    argon2: Argon2<'static>,
}

impl Argon2Verifier {
    /// Create a verifier with the default argon2id parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a verifier with explicit cost parameters
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        Ok(password_hash)
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(digest)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        // Parameters are read from the digest, so hashes made with other
        // cost settings still verify.
        let result = self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }
}
