//! Core domain logic for TwelveB, a page-and-sticky-note workspace.
//! This crate is the single source of truth for business invariants.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{load_config, AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, open_existing_db, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::page::{
    build_page_forest, Page, PageAppearance, PageId, PageSummary, PageTreeNode,
};
pub use model::quick_note::{QuickNote, QuickNoteId};
pub use model::settings::{Theme, UserSettings};
pub use model::sticky_note::{StickyNote, StickyNoteId};
pub use model::user::{PasswordResetToken, User, UserId};
pub use repo::page_repo::{PageRepository, SqlitePageRepository};
pub use repo::quick_note_repo::{QuickNoteRepository, SqliteQuickNoteRepository};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use repo::sticky_note_repo::{SqliteStickyNoteRepository, StickyNoteRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use search::page_search::{PageSearchHit, PageSearchQuery, SearchError};
pub use service::auth_service::{AuthService, AuthServiceError, RESET_TOKEN_TTL};
pub use service::page_service::{PageService, PageServiceError, WELCOME_PAGE_TITLE};
pub use service::quick_note_service::{QuickNoteService, QuickNoteServiceError};
pub use service::settings_service::{SettingsService, SettingsServiceError};
pub use service::sticky_note_service::{StickyNoteService, StickyNoteServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
