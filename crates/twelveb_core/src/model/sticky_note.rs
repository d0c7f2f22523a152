//! Sticky note model.

use crate::model::page::PageId;
use serde::{Deserialize, Serialize};

/// Identifier of a sticky note.
pub type StickyNoteId = i64;

/// A positioned, coloured annotation attached to exactly one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickyNote {
    pub id: StickyNoteId,
    pub page_id: PageId,
    pub content: String,
    /// Lowercase `#rrggbb`.
    pub color: String,
    pub x: i64,
    pub y: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
