//! Sticky note repository contracts and SQLite implementation.
//!
//! # Invariants
//! - New notes start at position `(0, 0)`.
//! - Every write stamps `updated_at`; position writes change nothing else.
//! - Listing order is deterministic: `id ASC`.

use crate::model::page::PageId;
use crate::model::sticky_note::{StickyNote, StickyNoteId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for sticky note operations.
pub trait StickyNoteRepository {
    /// Inserts one note at the default position and returns its id.
    fn add_sticky_note(&self, page_id: PageId, content: &str, color: &str)
        -> RepoResult<StickyNoteId>;
    /// Moves one note.
    fn update_position(&self, note_id: StickyNoteId, x: i64, y: i64) -> RepoResult<()>;
    /// Replaces the text of one note.
    fn update_content(&self, note_id: StickyNoteId, content: &str) -> RepoResult<()>;
    /// Loads one note.
    fn get_sticky_note(&self, note_id: StickyNoteId) -> RepoResult<Option<StickyNote>>;
    /// Lists the notes attached to one page.
    fn list_sticky_notes(&self, page_id: PageId) -> RepoResult<Vec<StickyNote>>;
    /// Deletes one note.
    fn delete_sticky_note(&self, note_id: StickyNoteId) -> RepoResult<()>;
    /// Returns whether the page row exists.
    fn page_exists(&self, page_id: PageId) -> RepoResult<bool>;
}

const SELECT_STICKY_NOTE: &str = "SELECT
        id,
        page_id,
        content,
        color,
        position_x,
        position_y,
        created_at,
        updated_at
     FROM sticky_notes";

/// SQLite-backed sticky note repository.
pub struct SqliteStickyNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStickyNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["pages", "sticky_notes"])?;
        Ok(Self { conn })
    }
}

impl StickyNoteRepository for SqliteStickyNoteRepository<'_> {
    fn add_sticky_note(
        &self,
        page_id: PageId,
        content: &str,
        color: &str,
    ) -> RepoResult<StickyNoteId> {
        self.conn.execute(
            "INSERT INTO sticky_notes (page_id, content, color, position_x, position_y)
             VALUES (?1, ?2, ?3, 0, 0);",
            params![page_id, content, color],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_position(&self, note_id: StickyNoteId, x: i64, y: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE sticky_notes
             SET position_x = ?2,
                 position_y = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![note_id, x, y],
        )?;
        ensure_changed(changed, note_id)
    }

    fn update_content(&self, note_id: StickyNoteId, content: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE sticky_notes
             SET content = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![note_id, content],
        )?;
        ensure_changed(changed, note_id)
    }

    fn get_sticky_note(&self, note_id: StickyNoteId) -> RepoResult<Option<StickyNote>> {
        let note = self
            .conn
            .query_row(
                &format!("{SELECT_STICKY_NOTE} WHERE id = ?1;"),
                [note_id],
                parse_sticky_row,
            )
            .optional()?;
        Ok(note)
    }

    fn list_sticky_notes(&self, page_id: PageId) -> RepoResult<Vec<StickyNote>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_STICKY_NOTE} WHERE page_id = ?1 ORDER BY id ASC;"))?;
        let rows = stmt.query_map([page_id], parse_sticky_row)?;
        let notes = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn delete_sticky_note(&self, note_id: StickyNoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM sticky_notes WHERE id = ?1;", [note_id])?;
        ensure_changed(changed, note_id)
    }

    fn page_exists(&self, page_id: PageId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pages WHERE id = ?1);",
            [page_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn ensure_changed(changed: usize, note_id: StickyNoteId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::not_found("sticky note", note_id));
    }
    Ok(())
}

fn parse_sticky_row(row: &Row<'_>) -> rusqlite::Result<StickyNote> {
    Ok(StickyNote {
        id: row.get("id")?,
        page_id: row.get("page_id")?,
        content: row.get("content")?,
        color: row.get("color")?,
        x: row.get("position_x")?,
        y: row.get("position_y")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
