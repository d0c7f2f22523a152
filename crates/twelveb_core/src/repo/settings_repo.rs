//! Settings store contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one settings row per user (`settings.user_id` is the key).
//! - `upsert_dark_mode` creates the row with default font/theme if absent.
//! - `update_preferences` never creates a row.

use crate::model::settings::{Theme, UserSettings};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, ensure_connection_ready, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for per-user settings.
pub trait SettingsRepository {
    /// Loads the settings row, if one exists.
    fn find_settings(&self, user_id: UserId) -> RepoResult<Option<UserSettings>>;
    /// Inserts or updates the dark-mode flag.
    fn upsert_dark_mode(&self, user_id: UserId, enabled: bool) -> RepoResult<()>;
    /// Updates font size and theme; returns `false` when no row exists.
    fn update_preferences(&self, user_id: UserId, font_size: u32, theme: Theme)
        -> RepoResult<bool>;
}

/// SQLite-backed settings store.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["settings"])?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn find_settings(&self, user_id: UserId) -> RepoResult<Option<UserSettings>> {
        let row = self
            .conn
            .query_row(
                "SELECT dark_mode, font_size, theme FROM settings WHERE user_id = ?1;",
                [user_id],
                |row| {
                    Ok((
                        row.get::<_, i64>("dark_mode")?,
                        row.get::<_, i64>("font_size")?,
                        row.get::<_, String>("theme")?,
                    ))
                },
            )
            .optional()?;

        let Some((dark_mode, font_size, theme)) = row else {
            return Ok(None);
        };

        let font_size = u32::try_from(font_size).map_err(|_| {
            RepoError::InvalidData(format!("invalid font size `{font_size}` in settings.font_size"))
        })?;
        let theme = theme
            .parse::<Theme>()
            .map_err(|message| RepoError::InvalidData(format!("{message} in settings.theme")))?;

        Ok(Some(UserSettings {
            dark_mode: int_to_bool(dark_mode, "settings.dark_mode")?,
            font_size,
            theme,
        }))
    }

    fn upsert_dark_mode(&self, user_id: UserId, enabled: bool) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO settings (user_id, dark_mode)
             VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET dark_mode = excluded.dark_mode;",
            params![user_id, bool_to_int(enabled)],
        )?;
        Ok(())
    }

    fn update_preferences(
        &self,
        user_id: UserId,
        font_size: u32,
        theme: Theme,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE settings SET font_size = ?2, theme = ?3 WHERE user_id = ?1;",
            params![user_id, font_size, theme.as_str()],
        )?;
        Ok(changed > 0)
    }
}
