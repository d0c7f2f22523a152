//! User account model.

use serde::{Deserialize, Serialize};

/// Identifier of a registered user.
pub type UserId = i64;

/// Public projection of a user account.
///
/// Credential material (password and security answer hashes) never leaves
/// the repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub security_question: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Stored credential row used only by authentication flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub id: UserId,
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub security_question: String,
    /// Argon2id PHC string of the normalized answer.
    pub security_answer_hash: String,
}

/// Single-use token issued after a correct security answer.
///
/// Only a hash of `token` is persisted; the plaintext is handed to the
/// caller exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    pub user_id: UserId,
    pub token: String,
    /// Unix epoch milliseconds after which the token is rejected.
    pub expires_at: i64,
}
