//! Quick note (checklist) use-case service.

use crate::model::quick_note::{QuickNote, QuickNoteId};
use crate::model::user::UserId;
use crate::repo::quick_note_repo::QuickNoteRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for quick note use-cases.
#[derive(Debug)]
pub enum QuickNoteServiceError {
    /// Text is blank after trim.
    EmptyText,
    /// Target quick note does not exist.
    NoteNotFound(QuickNoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for QuickNoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "quick note text must not be blank"),
            Self::NoteNotFound(id) => write!(f, "quick note not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for QuickNoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for QuickNoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "quick note",
                id,
            } => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Quick note service facade over repository implementations.
pub struct QuickNoteService<R: QuickNoteRepository> {
    repo: R,
}

impl<R: QuickNoteRepository> QuickNoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds an unchecked note for one user and returns its id.
    pub fn add(&self, user_id: UserId, text: &str) -> Result<QuickNoteId, QuickNoteServiceError> {
        let text = normalize_text(text)?;
        let note_id = self.repo.add_quick_note(user_id, text)?;
        info!("event=quick_note_add module=quick_note status=ok user_id={user_id} note_id={note_id}");
        Ok(note_id)
    }

    /// Loads one note.
    pub fn get(&self, note_id: QuickNoteId) -> Result<QuickNote, QuickNoteServiceError> {
        self.repo
            .get_quick_note(note_id)?
            .ok_or(QuickNoteServiceError::NoteNotFound(note_id))
    }

    /// Lists the notes of one user in creation order.
    pub fn list(&self, user_id: UserId) -> Result<Vec<QuickNote>, QuickNoteServiceError> {
        self.repo.list_quick_notes(user_id).map_err(Into::into)
    }

    /// Replaces the text of one note.
    pub fn edit(&self, note_id: QuickNoteId, text: &str) -> Result<(), QuickNoteServiceError> {
        let text = normalize_text(text)?;
        self.repo.update_text(note_id, text).map_err(Into::into)
    }

    /// Checks or unchecks one note.
    pub fn set_checked(
        &self,
        note_id: QuickNoteId,
        checked: bool,
    ) -> Result<(), QuickNoteServiceError> {
        self.repo.set_checked(note_id, checked).map_err(Into::into)
    }

    /// Deletes one note.
    pub fn delete(&self, note_id: QuickNoteId) -> Result<(), QuickNoteServiceError> {
        self.repo.delete_quick_note(note_id)?;
        info!("event=quick_note_delete module=quick_note status=ok note_id={note_id}");
        Ok(())
    }
}

fn normalize_text(value: &str) -> Result<&str, QuickNoteServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(QuickNoteServiceError::EmptyText);
    }
    Ok(trimmed)
}
