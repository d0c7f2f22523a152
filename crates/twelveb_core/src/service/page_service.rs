//! Page use-case service.
//!
//! # Responsibility
//! - Create, edit, move and delete pages with ownership checks.
//! - Rebuild the per-user page forest and run sidebar search.
//! - Seed the welcome page on first login.
//!
//! # Invariants
//! - Titles are non-blank after trim.
//! - A parent page must exist and belong to the same user.
//! - Moves never create parent cycles.
//! - The welcome page is created at most once per user.

use crate::model::page::{build_page_forest, Page, PageAppearance, PageId, PageSummary, PageTreeNode};
use crate::model::user::UserId;
use crate::repo::page_repo::{NewPage, PageRepository};
use crate::repo::RepoError;
use crate::search::page_search::{PageSearchHit, PageSearchQuery, SearchError};
use crate::service::normalize_hex_color;
use log::info;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Title of the page seeded for every user.
pub const WELCOME_PAGE_TITLE: &str = "Welcome to TwelveB";
/// Background colour of the welcome page.
pub const WELCOME_PAGE_COLOR: &str = "#f0f8ff";

const WELCOME_PAGE_CONTENT: &str = "# Welcome to TwelveB!

## Pages
- Create as many pages as you like
- Nest pages under other pages to build a hierarchy
- Move pages around to reorganize them
- Search titles and text of all your pages

## Sticky notes
- Attach colourful sticky notes to any page
- Drag them anywhere; their position is remembered

## Quick notes
- Keep a short checklist next to your pages

## Customization
- Dark and light mode
- Adjustable font size
- Multiple themes

## Security
- Passwords are stored hashed, never in plain text
- Forgot your password? Answer your security question to reset it

Happy organizing!
";

/// Service error for page use-cases.
#[derive(Debug)]
pub enum PageServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Colour is not `#RRGGBB`.
    InvalidColor(String),
    /// Owning user does not exist.
    UserNotFound(UserId),
    /// Target page does not exist.
    PageNotFound(PageId),
    /// Requested parent page does not exist.
    ParentNotFound(PageId),
    /// Requested parent belongs to a different user.
    ParentOwnedByOtherUser { page_id: Option<PageId>, parent_id: PageId },
    /// Move would create a parent cycle.
    CycleDetected { page_id: PageId, parent_id: PageId },
    /// Search-layer failure.
    Search(SearchError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for PageServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "page title must not be blank"),
            Self::InvalidColor(value) => {
                write!(f, "invalid colour `{value}`; expected #RRGGBB")
            }
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::PageNotFound(id) => write!(f, "page not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent page not found: {id}"),
            Self::ParentOwnedByOtherUser { page_id, parent_id } => match page_id {
                Some(page_id) => write!(
                    f,
                    "page {page_id} cannot be placed under page {parent_id} of another user"
                ),
                None => write!(f, "parent page {parent_id} belongs to another user"),
            },
            Self::CycleDetected { page_id, parent_id } => write!(
                f,
                "move would create cycle: page {page_id} under parent {parent_id}"
            ),
            Self::Search(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent page state: {details}"),
        }
    }
}

impl Error for PageServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Search(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PageServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "page", id } => Self::PageNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<SearchError> for PageServiceError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

/// Page service facade over repository implementations.
pub struct PageService<R: PageRepository> {
    repo: R,
}

impl<R: PageRepository> PageService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an empty page, optionally nested under `parent_id`.
    pub fn create_page(
        &self,
        user_id: UserId,
        title: &str,
        parent_id: Option<PageId>,
    ) -> Result<PageId, PageServiceError> {
        let title = normalize_title(title)?;
        if !self.repo.user_exists(user_id)? {
            return Err(PageServiceError::UserNotFound(user_id));
        }
        if let Some(parent_id) = parent_id {
            self.ensure_parent_owned_by(user_id, None, parent_id)?;
        }

        let page_id = self.repo.create_page(&NewPage {
            user_id,
            title,
            parent_id,
            ..NewPage::default()
        })?;
        info!("event=page_create module=page status=ok user_id={user_id} page_id={page_id}");
        Ok(page_id)
    }

    /// Loads one page.
    pub fn get_page(&self, page_id: PageId) -> Result<Page, PageServiceError> {
        self.repo
            .get_page(page_id)?
            .ok_or(PageServiceError::PageNotFound(page_id))
    }

    /// Renames one page and stamps `updated_at`.
    pub fn update_title(&self, page_id: PageId, title: &str) -> Result<(), PageServiceError> {
        let title = normalize_title(title)?;
        self.repo.update_title(page_id, &title)?;
        Ok(())
    }

    /// Replaces the page body and stamps `updated_at`.
    pub fn update_content(&self, page_id: PageId, content: &str) -> Result<(), PageServiceError> {
        self.repo.update_content(page_id, content)?;
        Ok(())
    }

    /// Replaces icon, cover and colour; blank values clear the attribute.
    pub fn set_appearance(
        &self,
        page_id: PageId,
        appearance: PageAppearance,
    ) -> Result<(), PageServiceError> {
        let color = match non_blank(appearance.color) {
            Some(value) => Some(
                normalize_hex_color(&value).ok_or(PageServiceError::InvalidColor(value))?,
            ),
            None => None,
        };
        let normalized = PageAppearance {
            icon: non_blank(appearance.icon),
            cover: non_blank(appearance.cover),
            color,
        };
        self.repo.set_appearance(page_id, &normalized)?;
        Ok(())
    }

    /// Lists `(id, title, parent_id)` rows in creation order.
    pub fn list_pages(&self, user_id: UserId) -> Result<Vec<PageSummary>, PageServiceError> {
        self.repo.list_pages(user_id).map_err(Into::into)
    }

    /// Builds the page forest of one user.
    pub fn page_tree(&self, user_id: UserId) -> Result<Vec<PageTreeNode>, PageServiceError> {
        let pages = self.repo.list_pages(user_id)?;
        Ok(build_page_forest(&pages))
    }

    /// Case-insensitive substring search over title and content.
    ///
    /// Blank terms return an empty list.
    pub fn search_pages(
        &self,
        user_id: UserId,
        term: &str,
    ) -> Result<Vec<PageSearchHit>, PageServiceError> {
        let hits = self
            .repo
            .search_pages(&PageSearchQuery::new(user_id, term))?;
        info!(
            "event=page_search module=page status=ok user_id={user_id} hits={}",
            hits.len()
        );
        Ok(hits)
    }

    /// Re-parents one page. `None` moves it to the root level.
    pub fn move_page(
        &self,
        page_id: PageId,
        new_parent_id: Option<PageId>,
    ) -> Result<(), PageServiceError> {
        let page = self.get_page(page_id)?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == page_id {
                return Err(PageServiceError::CycleDetected { page_id, parent_id });
            }
            self.ensure_parent_owned_by(page.user_id, Some(page_id), parent_id)?;
            if self.would_create_cycle(page_id, parent_id)? {
                return Err(PageServiceError::CycleDetected { page_id, parent_id });
            }
        }

        self.repo.set_parent(page_id, new_parent_id)?;
        Ok(())
    }

    /// Deletes one page. Children become roots; sticky notes are removed.
    pub fn delete_page(&self, page_id: PageId) -> Result<(), PageServiceError> {
        self.repo.delete_page(page_id)?;
        info!("event=page_delete module=page status=ok page_id={page_id}");
        Ok(())
    }

    /// Returns the user's welcome page, creating it on first call.
    pub fn ensure_welcome_page(&self, user_id: UserId) -> Result<PageId, PageServiceError> {
        if let Some(page_id) = self.repo.find_page_by_title(user_id, WELCOME_PAGE_TITLE)? {
            return Ok(page_id);
        }
        if !self.repo.user_exists(user_id)? {
            return Err(PageServiceError::UserNotFound(user_id));
        }

        let page_id = self.repo.create_page(&NewPage {
            user_id,
            title: WELCOME_PAGE_TITLE.to_string(),
            content: WELCOME_PAGE_CONTENT.to_string(),
            color: Some(WELCOME_PAGE_COLOR.to_string()),
            parent_id: None,
        })?;
        self.repo
            .get_page(page_id)?
            .ok_or(PageServiceError::InconsistentState(
                "welcome page not found in read-back",
            ))?;
        info!("event=page_welcome module=page status=ok user_id={user_id} page_id={page_id}");
        Ok(page_id)
    }

    fn ensure_parent_owned_by(
        &self,
        user_id: UserId,
        page_id: Option<PageId>,
        parent_id: PageId,
    ) -> Result<(), PageServiceError> {
        let parent = self
            .repo
            .get_page(parent_id)?
            .ok_or(PageServiceError::ParentNotFound(parent_id))?;
        if parent.user_id != user_id {
            return Err(PageServiceError::ParentOwnedByOtherUser { page_id, parent_id });
        }
        Ok(())
    }

    fn would_create_cycle(
        &self,
        page_id: PageId,
        candidate_parent_id: PageId,
    ) -> Result<bool, PageServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == page_id {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Ok(true);
            }

            let page = self
                .repo
                .get_page(current)?
                .ok_or(PageServiceError::ParentNotFound(current))?;
            cursor = page.parent_id;
        }
        Ok(false)
    }
}

fn normalize_title(value: &str) -> Result<String, PageServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PageServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}
