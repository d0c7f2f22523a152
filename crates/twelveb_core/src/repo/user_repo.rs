//! Credential store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist user accounts with hashed credential material.
//! - Persist and consume pending password-reset tokens.
//!
//! # Invariants
//! - `users.username` is unique; violations surface as
//!   `RepoError::DuplicateUsername`.
//! - At most one pending reset token per user.
//! - Completing a reset rewrites the password hash and consumes the token in
//!   one transaction.

use crate::model::user::{User, UserCredentials, UserId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{ffi, params, Connection, OptionalExtension};

/// Insert payload for a new account. Hashing happens before this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub security_question: String,
    pub security_answer_hash: String,
}

/// Persisted reset token state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResetToken {
    pub token_hash: String,
    pub expires_at: i64,
}

/// Repository interface for account operations.
pub trait UserRepository {
    /// Inserts one account and returns its generated id.
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId>;
    /// Loads credential material by exact username.
    fn find_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>>;
    /// Loads the public projection of one account.
    fn get_user(&self, user_id: UserId) -> RepoResult<Option<User>>;
    /// Stores (or replaces) the pending reset token of one account.
    fn store_reset_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: i64,
    ) -> RepoResult<()>;
    /// Loads the pending reset token of one account.
    fn find_reset_token(&self, user_id: UserId) -> RepoResult<Option<StoredResetToken>>;
    /// Drops the pending reset token of one account, if any.
    fn clear_reset_token(&self, user_id: UserId) -> RepoResult<()>;
    /// Rewrites the password hash and consumes the reset token atomically.
    fn complete_reset(&self, user_id: UserId, password_hash: &str) -> RepoResult<()>;
    /// Deletes one account; dependent rows cascade.
    fn delete_user(&self, user_id: UserId) -> RepoResult<()>;
}

/// SQLite-backed credential store.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "password_resets"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId> {
        let inserted = self.conn.execute(
            "INSERT INTO users (
                username,
                password_hash,
                security_question,
                security_answer_hash
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.username.as_str(),
                user.password_hash.as_str(),
                user.security_question.as_str(),
                user.security_answer_hash.as_str(),
            ],
        );

        match inserted {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(err) if is_unique_violation(&err) => {
                Err(RepoError::DuplicateUsername(user.username.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>> {
        let credentials = self
            .conn
            .query_row(
                "SELECT
                    id,
                    username,
                    password_hash,
                    security_question,
                    security_answer_hash
                 FROM users
                 WHERE username = ?1;",
                [username],
                |row| {
                    Ok(UserCredentials {
                        id: row.get("id")?,
                        username: row.get("username")?,
                        password_hash: row.get("password_hash")?,
                        security_question: row.get("security_question")?,
                        security_answer_hash: row.get("security_answer_hash")?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }

    fn get_user(&self, user_id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, security_question, created_at
                 FROM users
                 WHERE id = ?1;",
                [user_id],
                |row| {
                    Ok(User {
                        id: row.get("id")?,
                        username: row.get("username")?,
                        security_question: row.get("security_question")?,
                        created_at: row.get("created_at")?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn store_reset_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: i64,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO password_resets (user_id, token_hash, expires_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                token_hash = excluded.token_hash,
                expires_at = excluded.expires_at,
                created_at = (strftime('%s', 'now') * 1000);",
            params![user_id, token_hash, expires_at],
        )?;
        Ok(())
    }

    fn find_reset_token(&self, user_id: UserId) -> RepoResult<Option<StoredResetToken>> {
        let token = self
            .conn
            .query_row(
                "SELECT token_hash, expires_at
                 FROM password_resets
                 WHERE user_id = ?1;",
                [user_id],
                |row| {
                    Ok(StoredResetToken {
                        token_hash: row.get("token_hash")?,
                        expires_at: row.get("expires_at")?,
                    })
                },
            )
            .optional()?;
        Ok(token)
    }

    fn clear_reset_token(&self, user_id: UserId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM password_resets WHERE user_id = ?1;", [user_id])?;
        Ok(())
    }

    fn complete_reset(&self, user_id: UserId, password_hash: &str) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1;",
            params![user_id, password_hash],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("user", user_id));
        }
        tx.execute("DELETE FROM password_resets WHERE user_id = ?1;", [user_id])?;
        tx.commit()?;
        Ok(())
    }

    fn delete_user(&self, user_id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [user_id])?;
        if changed == 0 {
            return Err(RepoError::not_found("user", user_id));
        }
        Ok(())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
