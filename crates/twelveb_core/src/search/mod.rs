//! Search subsystem.
//!
//! # Responsibility
//! - Provide typed page search APIs for the workspace sidebar.
//! - Keep query construction and escaping rules in one place.

pub mod page_search;
