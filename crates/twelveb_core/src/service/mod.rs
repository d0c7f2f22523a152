//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Validate user input above the repository layer.
//! - Keep presentation layers decoupled from storage details.

use once_cell::sync::Lazy;
use regex::Regex;

pub mod auth_service;
pub mod page_service;
pub mod quick_note_service;
pub mod settings_service;
pub mod sticky_note_service;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex colour regex"));

/// Normalizes a `#RRGGBB` colour to lowercase; `None` when malformed.
pub fn normalize_hex_color(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if HEX_COLOR_RE.is_match(trimmed) {
        Some(trimmed.to_ascii_lowercase())
    } else {
        None
    }
}
