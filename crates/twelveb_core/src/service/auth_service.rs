//! Account use-case service: registration, login and password recovery.
//!
//! # Responsibility
//! - Validate registration input and hash credential material.
//! - Authenticate username/password pairs.
//! - Run the security-question recovery flow with single-use reset tokens.
//!
//! # Invariants
//! - Passwords and security answers are stored only as Argon2id hashes.
//! - Security answers compare case-insensitively and ignore surrounding
//!   whitespace.
//! - Recovery never reveals a stored password; it issues a reset token that
//!   expires after [`RESET_TOKEN_TTL`] and is consumed on use.
//! - Login failures do not distinguish unknown users from wrong passwords.

use crate::auth::password::{hash_secret, normalize_security_answer, verify_secret, HashError};
use crate::model::user::{PasswordResetToken, User, UserId};
use crate::repo::user_repo::{NewUser, UserRepository};
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Lifetime of a password reset token.
pub const RESET_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AuthServiceError {
    /// A required field is blank.
    InvalidInput(&'static str),
    /// Username is already registered.
    DuplicateUsername(String),
    /// No account matches the given username/password.
    NotFound,
    /// Security answer does not match.
    WrongAnswer,
    /// Reset token is unknown, already used, or does not match.
    InvalidResetToken,
    /// Reset token matched but its lifetime elapsed.
    ResetTokenExpired,
    /// Hashing backend failure or malformed stored hash.
    Hash(HashError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AuthServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(field) => write!(f, "{field} must not be blank"),
            Self::DuplicateUsername(username) => {
                write!(f, "username already exists: `{username}`")
            }
            Self::NotFound => write!(f, "invalid username or password"),
            Self::WrongAnswer => write!(f, "incorrect security answer"),
            Self::InvalidResetToken => write!(f, "invalid password reset token"),
            Self::ResetTokenExpired => write!(f, "password reset token expired"),
            Self::Hash(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Hash(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateUsername(username) => Self::DuplicateUsername(username),
            RepoError::NotFound { entity: "user", .. } => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

impl From<HashError> for AuthServiceError {
    fn from(value: HashError) -> Self {
        Self::Hash(value)
    }
}

/// Account service facade over a credential store.
pub struct AuthService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AuthService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new account and returns its id.
    ///
    /// # Errors
    /// - `InvalidInput` when any field is blank.
    /// - `DuplicateUsername` when the username is taken.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        security_question: &str,
        security_answer: &str,
    ) -> Result<UserId, AuthServiceError> {
        let username = require_non_blank(username, "username")?;
        require_non_blank(password, "password")?;
        let security_question = require_non_blank(security_question, "security question")?;
        let security_answer = require_non_blank(security_answer, "security answer")?;

        let new_user = NewUser {
            username: username.to_string(),
            password_hash: hash_secret(password)?,
            security_question: security_question.to_string(),
            security_answer_hash: hash_secret(&normalize_security_answer(security_answer))?,
        };

        match self.repo.create_user(&new_user) {
            Ok(user_id) => {
                info!("event=user_register module=auth status=ok user_id={user_id}");
                Ok(user_id)
            }
            Err(err) => {
                warn!("event=user_register module=auth status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Returns the account id for matching credentials.
    ///
    /// # Errors
    /// - `NotFound` for an unknown username or a mismatched password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<UserId, AuthServiceError> {
        let Some(credentials) = self.repo.find_credentials(username.trim())? else {
            info!("event=user_login module=auth status=rejected");
            return Err(AuthServiceError::NotFound);
        };

        if !verify_secret(password, &credentials.password_hash)? {
            info!(
                "event=user_login module=auth status=rejected user_id={}",
                credentials.id
            );
            return Err(AuthServiceError::NotFound);
        }

        info!(
            "event=user_login module=auth status=ok user_id={}",
            credentials.id
        );
        Ok(credentials.id)
    }

    /// Returns the security question shown by the recovery flow.
    pub fn security_question(&self, username: &str) -> Result<String, AuthServiceError> {
        self.repo
            .find_credentials(username.trim())?
            .map(|credentials| credentials.security_question)
            .ok_or(AuthServiceError::NotFound)
    }

    /// Verifies the security answer and issues a single-use reset token.
    ///
    /// Any previously issued token for the account is replaced.
    ///
    /// # Errors
    /// - `NotFound` for an unknown username.
    /// - `WrongAnswer` when the answer does not match.
    pub fn begin_password_reset(
        &self,
        username: &str,
        answer: &str,
    ) -> Result<PasswordResetToken, AuthServiceError> {
        let credentials = self
            .repo
            .find_credentials(username.trim())?
            .ok_or(AuthServiceError::NotFound)?;

        let normalized = normalize_security_answer(answer);
        if !verify_secret(&normalized, &credentials.security_answer_hash)? {
            info!(
                "event=password_reset_begin module=auth status=rejected user_id={}",
                credentials.id
            );
            return Err(AuthServiceError::WrongAnswer);
        }

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = now_epoch_ms() + duration_ms(RESET_TOKEN_TTL);
        self.repo
            .store_reset_token(credentials.id, &hash_secret(&token)?, expires_at)?;

        info!(
            "event=password_reset_begin module=auth status=ok user_id={}",
            credentials.id
        );
        Ok(PasswordResetToken {
            user_id: credentials.id,
            token,
            expires_at,
        })
    }

    /// Replaces the password using a reset token and consumes the token.
    ///
    /// # Errors
    /// - `NotFound` for an unknown username.
    /// - `InvalidResetToken` when no token is pending or it does not match.
    /// - `ResetTokenExpired` when the token lifetime elapsed; the stale token
    ///   is discarded.
    /// - `InvalidInput` when the new password is blank.
    pub fn complete_password_reset(
        &self,
        username: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthServiceError> {
        require_non_blank(new_password, "password")?;
        let credentials = self
            .repo
            .find_credentials(username.trim())?
            .ok_or(AuthServiceError::NotFound)?;
        let stored = self
            .repo
            .find_reset_token(credentials.id)?
            .ok_or(AuthServiceError::InvalidResetToken)?;

        if !verify_secret(token.trim(), &stored.token_hash)? {
            info!(
                "event=password_reset_complete module=auth status=rejected user_id={}",
                credentials.id
            );
            return Err(AuthServiceError::InvalidResetToken);
        }

        if now_epoch_ms() > stored.expires_at {
            self.repo.clear_reset_token(credentials.id)?;
            info!(
                "event=password_reset_complete module=auth status=expired user_id={}",
                credentials.id
            );
            return Err(AuthServiceError::ResetTokenExpired);
        }

        self.repo
            .complete_reset(credentials.id, &hash_secret(new_password)?)?;
        info!(
            "event=password_reset_complete module=auth status=ok user_id={}",
            credentials.id
        );
        Ok(())
    }

    /// Loads the public projection of one account.
    pub fn get_user(&self, user_id: UserId) -> Result<User, AuthServiceError> {
        self.repo
            .get_user(user_id)?
            .ok_or(AuthServiceError::NotFound)
    }

    /// Deletes one account together with everything it owns.
    pub fn delete_user(&self, user_id: UserId) -> Result<(), AuthServiceError> {
        self.repo.delete_user(user_id)?;
        info!("event=user_delete module=auth status=ok user_id={user_id}");
        Ok(())
    }
}

fn require_non_blank<'a>(
    value: &'a str,
    field: &'static str,
) -> Result<&'a str, AuthServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthServiceError::InvalidInput(field));
    }
    Ok(trimmed)
}

fn duration_ms(value: Duration) -> i64 {
    i64::try_from(value.as_millis()).unwrap_or(i64::MAX)
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_ms)
        .unwrap_or(0)
}
