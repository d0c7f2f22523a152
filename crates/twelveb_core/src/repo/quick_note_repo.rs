//! Quick note (checklist) repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Notes are addressed by id, never by their text.
//! - Listing order is deterministic: `created_at ASC, id ASC`.

use crate::model::quick_note::{QuickNote, QuickNoteId};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, ensure_connection_ready, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

/// Repository interface for quick note operations.
pub trait QuickNoteRepository {
    /// Inserts one unchecked note and returns its id.
    fn add_quick_note(&self, user_id: UserId, text: &str) -> RepoResult<QuickNoteId>;
    /// Loads one note.
    fn get_quick_note(&self, note_id: QuickNoteId) -> RepoResult<Option<QuickNote>>;
    /// Lists the notes of one user.
    fn list_quick_notes(&self, user_id: UserId) -> RepoResult<Vec<QuickNote>>;
    /// Replaces the text of one note.
    fn update_text(&self, note_id: QuickNoteId, text: &str) -> RepoResult<()>;
    /// Sets or clears the checked mark.
    fn set_checked(&self, note_id: QuickNoteId, checked: bool) -> RepoResult<()>;
    /// Deletes one note.
    fn delete_quick_note(&self, note_id: QuickNoteId) -> RepoResult<()>;
}

const SELECT_QUICK_NOTE: &str =
    "SELECT id, user_id, text, checked, created_at, updated_at FROM quick_notes";

/// SQLite-backed quick note repository.
pub struct SqliteQuickNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuickNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["quick_notes"])?;
        Ok(Self { conn })
    }
}

impl QuickNoteRepository for SqliteQuickNoteRepository<'_> {
    fn add_quick_note(&self, user_id: UserId, text: &str) -> RepoResult<QuickNoteId> {
        self.conn.execute(
            "INSERT INTO quick_notes (user_id, text) VALUES (?1, ?2);",
            params![user_id, text],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_quick_note(&self, note_id: QuickNoteId) -> RepoResult<Option<QuickNote>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_QUICK_NOTE} WHERE id = ?1;"))?;
        let mut rows = stmt.query([note_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_quick_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_quick_notes(&self, user_id: UserId) -> RepoResult<Vec<QuickNote>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_QUICK_NOTE} WHERE user_id = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_quick_note_row(row)?);
        }
        Ok(notes)
    }

    fn update_text(&self, note_id: QuickNoteId, text: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE quick_notes
             SET text = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![note_id, text],
        )?;
        ensure_changed(changed, note_id)
    }

    fn set_checked(&self, note_id: QuickNoteId, checked: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE quick_notes
             SET checked = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![note_id, bool_to_int(checked)],
        )?;
        ensure_changed(changed, note_id)
    }

    fn delete_quick_note(&self, note_id: QuickNoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM quick_notes WHERE id = ?1;", [note_id])?;
        ensure_changed(changed, note_id)
    }
}

fn ensure_changed(changed: usize, note_id: QuickNoteId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::not_found("quick note", note_id));
    }
    Ok(())
}

fn parse_quick_note_row(row: &Row<'_>) -> RepoResult<QuickNote> {
    Ok(QuickNote {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        text: row.get("text")?,
        checked: int_to_bool(row.get("checked")?, "quick_notes.checked")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
