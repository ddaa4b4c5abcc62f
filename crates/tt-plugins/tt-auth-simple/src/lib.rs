//! # tt-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles staff password hashing and opaque bearer session tokens.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tt_core::error::{AppError, Result};
use tt_core::traits::AuthProvider;

/// Bytes of entropy in a session token (hex-encoded to twice this length).
const TOKEN_BYTES: usize = 32;

#[derive(Default)]
pub struct SimpleAuthProvider {
    argon2: Argon2<'static>,
}

impl SimpleAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn generate_session_token(&self) -> Result<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| AppError::Internal(format!("no randomness for session token: {e}")))?;
        Ok(hex::encode(bytes))
    }

    /// SHA-256 of the token; only this digest is persisted.
    fn digest_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
