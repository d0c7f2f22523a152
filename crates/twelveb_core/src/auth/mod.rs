//! Credential hashing primitives.
//!
//! # Responsibility
//! - Hash and verify passwords, security answers and reset tokens.
//!
//! # Invariants
//! - Plaintext credentials are never persisted or logged.

pub mod password;
