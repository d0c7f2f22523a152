//! Argon2id hashing for secrets stored in the credential store.
//!
//! Every secret is hashed with a fresh random salt and stored as a PHC string
//! (`$argon2id$v=19$m=19456,t=2,p=1$...`). Verification parses the stored
//! string, so parameters can change without invalidating existing rows.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure while producing or parsing a hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashError(String);

impl Display for HashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "credential hashing failed: {}", self.0)
    }
}

impl Error for HashError {}

/// Hashes a secret with Argon2id and a random salt.
pub fn hash_secret(secret: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| HashError(err.to_string()))
}

/// Checks a secret against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch and `Err` only for malformed hashes.
pub fn verify_secret(secret: &str, stored_hash: &str) -> Result<bool, HashError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|err| HashError(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}

/// Canonical form of a security answer: trimmed and lowercased, so that
/// answers compare case-insensitively after hashing.
pub fn normalize_security_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{hash_secret, normalize_security_answer, verify_secret};

    #[test]
    fn hash_verifies_only_the_original_secret() {
        let hash = hash_secret("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_secret("hunter2", &hash).unwrap());
        assert!(!verify_secret("hunter3", &hash).unwrap());
    }

    #[test]
    fn same_secret_hashes_differently() {
        assert_ne!(hash_secret("same").unwrap(), hash_secret("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_secret("x", "plaintext-password").is_err());
    }

    #[test]
    fn answers_normalize_case_and_whitespace() {
        assert_eq!(normalize_security_answer("  Fluffy "), "fluffy");
    }
}
