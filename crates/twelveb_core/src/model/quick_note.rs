//! Checklist-style quick note model.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Identifier of a quick note.
pub type QuickNoteId = i64;

/// Short per-user checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickNote {
    pub id: QuickNoteId,
    pub user_id: UserId,
    pub text: String,
    pub checked: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
