//! Settings use-case service.
//!
//! # Invariants
//! - Reads of a user without a settings row return defaults
//!   (`dark_mode=false`, `font_size=16`, `theme=default`).
//! - Dark-mode writes create the row lazily.
//! - Preference writes require an existing row and are a no-op otherwise.

use crate::model::settings::{Theme, UserSettings, MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::model::user::UserId;
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for settings use-cases.
#[derive(Debug)]
pub enum SettingsServiceError {
    /// Font size outside the supported range.
    InvalidFontSize(u32),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for SettingsServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFontSize(size) => write!(
                f,
                "font size {size} outside supported range {MIN_FONT_SIZE}..={MAX_FONT_SIZE}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidFontSize(_) => None,
        }
    }
}

impl From<RepoError> for SettingsServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Settings service facade over repository implementations.
pub struct SettingsService<R: SettingsRepository> {
    repo: R,
}

impl<R: SettingsRepository> SettingsService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns stored settings or defaults when none exist.
    pub fn get_settings(&self, user_id: UserId) -> Result<UserSettings, SettingsServiceError> {
        Ok(self.repo.find_settings(user_id)?.unwrap_or_default())
    }

    /// Sets the dark-mode flag, creating the settings row if needed.
    pub fn set_dark_mode(&self, user_id: UserId, enabled: bool) -> Result<(), SettingsServiceError> {
        self.repo.upsert_dark_mode(user_id, enabled)?;
        info!("event=settings_dark_mode module=settings status=ok user_id={user_id} enabled={enabled}");
        Ok(())
    }

    /// Flips dark mode and returns the new state.
    ///
    /// Without a settings row the first toggle enables dark mode.
    pub fn toggle_dark_mode(&self, user_id: UserId) -> Result<bool, SettingsServiceError> {
        let enabled = !self.get_settings(user_id)?.dark_mode;
        self.set_dark_mode(user_id, enabled)?;
        Ok(enabled)
    }

    /// Updates font size and theme of an existing settings row.
    ///
    /// Returns `false` (and writes nothing) when the user has no row yet.
    pub fn set_preferences(
        &self,
        user_id: UserId,
        font_size: u32,
        theme: Theme,
    ) -> Result<bool, SettingsServiceError> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&font_size) {
            return Err(SettingsServiceError::InvalidFontSize(font_size));
        }
        let updated = self.repo.update_preferences(user_id, font_size, theme)?;
        info!(
            "event=settings_preferences module=settings status={} user_id={user_id}",
            if updated { "ok" } else { "skipped" }
        );
        Ok(updated)
    }
}
