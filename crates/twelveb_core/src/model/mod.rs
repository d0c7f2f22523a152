//! Domain model for users, pages and their annotations.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep read models free of SQL and presentation details.
//!
//! # Invariants
//! - Every persisted record is identified by its SQLite rowid.
//! - Timestamps are Unix epoch milliseconds.

pub mod page;
pub mod quick_note;
pub mod settings;
pub mod sticky_note;
pub mod user;
