//! Shared utility functions for studio-forge.
//!
//! Identifier validation for filesystem-backed stores and small text helpers
//! used by the tool handlers and the agent loop.

pub mod text;

pub use text::{is_safe_id, safe_file_stem, short_id, truncate_chars};
