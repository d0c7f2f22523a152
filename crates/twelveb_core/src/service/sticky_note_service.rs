//! Sticky note use-case service.
//!
//! # Invariants
//! - Content is non-blank after trim.
//! - Colours are `#RRGGBB`, stored lowercase.
//! - Position updates are idempotent apart from the `updated_at` stamp.

use crate::model::page::PageId;
use crate::model::sticky_note::{StickyNote, StickyNoteId};
use crate::repo::sticky_note_repo::StickyNoteRepository;
use crate::repo::RepoError;
use crate::service::normalize_hex_color;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for sticky note use-cases.
#[derive(Debug)]
pub enum StickyNoteServiceError {
    /// Content is blank after trim.
    EmptyContent,
    /// Colour is not `#RRGGBB`.
    InvalidColor(String),
    /// Target page does not exist.
    PageNotFound(PageId),
    /// Target sticky note does not exist.
    NoteNotFound(StickyNoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for StickyNoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "sticky note content must not be blank"),
            Self::InvalidColor(value) => {
                write!(f, "invalid colour `{value}`; expected #RRGGBB")
            }
            Self::PageNotFound(id) => write!(f, "page not found: {id}"),
            Self::NoteNotFound(id) => write!(f, "sticky note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StickyNoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StickyNoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "sticky note",
                id,
            } => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Sticky note service facade over repository implementations.
pub struct StickyNoteService<R: StickyNoteRepository> {
    repo: R,
}

impl<R: StickyNoteRepository> StickyNoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Attaches a note at position `(0, 0)` and returns its id.
    pub fn add_sticky_note(
        &self,
        page_id: PageId,
        content: &str,
        color: &str,
    ) -> Result<StickyNoteId, StickyNoteServiceError> {
        let content = normalize_content(content)?;
        let color = normalize_hex_color(color)
            .ok_or_else(|| StickyNoteServiceError::InvalidColor(color.to_string()))?;
        if !self.repo.page_exists(page_id)? {
            return Err(StickyNoteServiceError::PageNotFound(page_id));
        }

        let note_id = self.repo.add_sticky_note(page_id, content, &color)?;
        info!("event=sticky_add module=sticky status=ok page_id={page_id} note_id={note_id}");
        Ok(note_id)
    }

    /// Persists the drop position of a dragged note.
    pub fn update_position(
        &self,
        note_id: StickyNoteId,
        x: i64,
        y: i64,
    ) -> Result<(), StickyNoteServiceError> {
        self.repo.update_position(note_id, x, y)?;
        debug!("event=sticky_move module=sticky status=ok note_id={note_id} x={x} y={y}");
        Ok(())
    }

    /// Replaces the text of one note.
    pub fn update_content(
        &self,
        note_id: StickyNoteId,
        content: &str,
    ) -> Result<(), StickyNoteServiceError> {
        let content = normalize_content(content)?;
        self.repo.update_content(note_id, content)?;
        Ok(())
    }

    /// Loads one note.
    pub fn get_sticky_note(
        &self,
        note_id: StickyNoteId,
    ) -> Result<StickyNote, StickyNoteServiceError> {
        self.repo
            .get_sticky_note(note_id)?
            .ok_or(StickyNoteServiceError::NoteNotFound(note_id))
    }

    /// Lists the notes of one page in creation order.
    pub fn list_sticky_notes(
        &self,
        page_id: PageId,
    ) -> Result<Vec<StickyNote>, StickyNoteServiceError> {
        if !self.repo.page_exists(page_id)? {
            return Err(StickyNoteServiceError::PageNotFound(page_id));
        }
        self.repo.list_sticky_notes(page_id).map_err(Into::into)
    }

    /// Deletes one note.
    pub fn delete_sticky_note(&self, note_id: StickyNoteId) -> Result<(), StickyNoteServiceError> {
        self.repo.delete_sticky_note(note_id)?;
        info!("event=sticky_delete module=sticky status=ok note_id={note_id}");
        Ok(())
    }
}

fn normalize_content(value: &str) -> Result<&str, StickyNoteServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StickyNoteServiceError::EmptyContent);
    }
    Ok(trimmed)
}
