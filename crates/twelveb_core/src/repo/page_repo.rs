//! Page repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide page CRUD over the `pages` table.
//! - Provide flat per-user listing used to rebuild the page forest.
//!
//! # Invariants
//! - Every content/title/appearance/parent write stamps `updated_at`.
//! - Listing order is deterministic: `created_at ASC, id ASC`.
//! - Deleting a page nulls children's `parent_id` and cascades to its sticky
//!   notes (enforced by foreign keys).

use crate::model::page::{Page, PageAppearance, PageId, PageSummary};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use crate::search::page_search::{self, PageSearchHit, PageSearchQuery, SearchResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PAGE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    title,
    content,
    icon,
    cover,
    color,
    parent_id,
    created_at,
    updated_at
FROM pages";

/// Insert payload for a new page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPage {
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub color: Option<String>,
    pub parent_id: Option<PageId>,
}

/// Repository interface for page operations.
pub trait PageRepository {
    /// Inserts one page and returns its generated id.
    fn create_page(&self, page: &NewPage) -> RepoResult<PageId>;
    /// Loads one page by id.
    fn get_page(&self, page_id: PageId) -> RepoResult<Option<Page>>;
    /// Finds the oldest page of a user with exactly this title.
    fn find_page_by_title(&self, user_id: UserId, title: &str) -> RepoResult<Option<PageId>>;
    /// Replaces the title.
    fn update_title(&self, page_id: PageId, title: &str) -> RepoResult<()>;
    /// Replaces the body text.
    fn update_content(&self, page_id: PageId, content: &str) -> RepoResult<()>;
    /// Replaces icon, cover and colour together.
    fn set_appearance(&self, page_id: PageId, appearance: &PageAppearance) -> RepoResult<()>;
    /// Re-parents one page. `None` makes it a root.
    fn set_parent(&self, page_id: PageId, parent_id: Option<PageId>) -> RepoResult<()>;
    /// Lists `(id, title, parent_id)` rows of one user.
    fn list_pages(&self, user_id: UserId) -> RepoResult<Vec<PageSummary>>;
    /// Case-insensitive substring search over title and content.
    fn search_pages(&self, query: &PageSearchQuery) -> SearchResult<Vec<PageSearchHit>>;
    /// Deletes one page.
    fn delete_page(&self, page_id: PageId) -> RepoResult<()>;
    /// Returns whether the user row exists.
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed page repository.
pub struct SqlitePageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePageRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "pages", "sticky_notes"])?;
        Ok(Self { conn })
    }
}

impl PageRepository for SqlitePageRepository<'_> {
    fn create_page(&self, page: &NewPage) -> RepoResult<PageId> {
        self.conn.execute(
            "INSERT INTO pages (user_id, title, content, color, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                page.user_id,
                page.title.as_str(),
                page.content.as_str(),
                page.color.as_deref(),
                page.parent_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_page(&self, page_id: PageId) -> RepoResult<Option<Page>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PAGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([page_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_page_row(row)?));
        }
        Ok(None)
    }

    fn find_page_by_title(&self, user_id: UserId, title: &str) -> RepoResult<Option<PageId>> {
        let page_id = self
            .conn
            .query_row(
                "SELECT id
                 FROM pages
                 WHERE user_id = ?1 AND title = ?2
                 ORDER BY created_at ASC, id ASC
                 LIMIT 1;",
                params![user_id, title],
                |row| row.get(0),
            )
            .optional()?;
        Ok(page_id)
    }

    fn update_title(&self, page_id: PageId, title: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE pages
             SET title = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![page_id, title],
        )?;
        ensure_changed(changed, page_id)
    }

    fn update_content(&self, page_id: PageId, content: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE pages
             SET content = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![page_id, content],
        )?;
        ensure_changed(changed, page_id)
    }

    fn set_appearance(&self, page_id: PageId, appearance: &PageAppearance) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE pages
             SET icon = ?2,
                 cover = ?3,
                 color = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                page_id,
                appearance.icon.as_deref(),
                appearance.cover.as_deref(),
                appearance.color.as_deref(),
            ],
        )?;
        ensure_changed(changed, page_id)
    }

    fn set_parent(&self, page_id: PageId, parent_id: Option<PageId>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE pages
             SET parent_id = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![page_id, parent_id],
        )?;
        ensure_changed(changed, page_id)
    }

    fn list_pages(&self, user_id: UserId) -> RepoResult<Vec<PageSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, parent_id
             FROM pages
             WHERE user_id = ?1
             ORDER BY created_at ASC, id ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut pages = Vec::new();
        while let Some(row) = rows.next()? {
            pages.push(PageSummary {
                id: row.get("id")?,
                title: row.get("title")?,
                parent_id: row.get("parent_id")?,
            });
        }
        Ok(pages)
    }

    fn search_pages(&self, query: &PageSearchQuery) -> SearchResult<Vec<PageSearchHit>> {
        page_search::search_pages(self.conn, query)
    }

    fn delete_page(&self, page_id: PageId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM pages WHERE id = ?1;", [page_id])?;
        ensure_changed(changed, page_id)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn ensure_changed(changed: usize, page_id: PageId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::not_found("page", page_id));
    }
    Ok(())
}

fn parse_page_row(row: &Row<'_>) -> RepoResult<Page> {
    Ok(Page {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        icon: row.get("icon")?,
        cover: row.get("cover")?,
        color: row.get("color")?,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
