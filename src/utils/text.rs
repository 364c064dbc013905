//! Text helpers shared by stores, tools, and the agent loop.

use std::sync::OnceLock;

use regex::Regex;

/// Pattern for identifiers that are safe to use as a single path component.
static SAFE_ID: OnceLock<Regex> = OnceLock::new();

fn safe_id_regex() -> &'static Regex {
    SAFE_ID.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex is valid"))
}

/// Returns true if `id` can be used verbatim as a directory or file name.
///
/// Project, job, and source identifiers end up in filesystem paths, so only
/// ASCII alphanumerics, hyphens, and underscores are accepted.
pub fn is_safe_id(id: &str) -> bool {
    safe_id_regex().is_match(id)
}

/// Truncates `text` to at most `max_chars` characters, respecting UTF-8
/// boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// First eight characters of an identifier, for log lines and task labels.
pub fn short_id(id: &str) -> &str {
    truncate_chars(id, 8)
}

/// Converts a free-form display name into a lowercase file stem.
///
/// Alphanumerics, spaces, hyphens, and underscores are kept; everything else
/// becomes `_`, then spaces become `_`. Empty results fall back to `fallback`.
pub fn safe_file_stem(name: &str, fallback: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .replace(' ', "_")
        .to_lowercase();

    if stem.is_empty() {
        fallback.to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_safe_id() {
        assert!(is_safe_id("job-123_abc"));
        assert!(is_safe_id("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_safe_id(""));
        assert!(!is_safe_id("../etc"));
        assert!(!is_safe_id("a/b"));
        assert!(!is_safe_id("with space"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Primary Button", "v1"), "primary_button");
        assert_eq!(safe_file_stem("Card / Dark", "v1"), "card___dark");
        assert_eq!(safe_file_stem("", "variation_2"), "variation_2");
    }
}
