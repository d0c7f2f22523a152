//! Case-insensitive substring search over page titles and bodies.
//!
//! # Responsibility
//! - Match a term against `pages.title` and `pages.content` of one user.
//! - Return typed hits with stable IDs.
//!
//! # Invariants
//! - Only pages owned by the querying user are returned.
//! - Blank terms return no hits.
//! - `%`, `_` and `\` in the term match literally.
//! - Result ordering is deterministic: `created_at ASC, id ASC`.
//! - Both sides are folded with Unicode lowercasing (`casefold`), so
//!   non-ASCII letters match regardless of case.

use crate::db::DbError;
use crate::model::page::PageId;
use crate::model::user::UserId;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error.
#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search options for one page query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSearchQuery {
    pub user_id: UserId,
    /// Raw user term; trimmed before matching.
    pub text: String,
    /// Maximum hits. `None` returns all matches.
    pub limit: Option<u32>,
}

impl PageSearchQuery {
    /// Creates an unbounded query for one user.
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            limit: None,
        }
    }
}

/// Single search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSearchHit {
    pub page_id: PageId,
    pub title: String,
    pub content: String,
}

/// Searches pages of one user by case-insensitive substring.
pub fn search_pages(conn: &Connection, query: &PageSearchQuery) -> SearchResult<Vec<PageSearchHit>> {
    let Some(pattern) = build_like_pattern(&query.text) else {
        return Ok(Vec::new());
    };
    if query.limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT id, title, content
         FROM pages
         WHERE user_id = ?
           AND (casefold(title) LIKE ? ESCAPE '\\' OR casefold(content) LIKE ? ESCAPE '\\')
         ORDER BY created_at ASC, id ASC",
    );
    let mut bind_values: Vec<Value> = vec![
        Value::Integer(query.user_id),
        Value::Text(pattern.clone()),
        Value::Text(pattern),
    ];
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        hits.push(PageSearchHit {
            page_id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
        });
    }
    Ok(hits)
}

fn build_like_pattern(text: &str) -> Option<String> {
    let term = text.trim();
    if term.is_empty() {
        return None;
    }
    Some(format!("%{}%", escape_like_term(&term.to_lowercase())))
}

fn escape_like_term(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
