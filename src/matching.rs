//! Matching primitives shared by the index query layer and the prompt
//! analyzer.
//!
//! Scope keys are stored flat; hierarchy lives entirely in
//! [`scope_matches`]. Ancestors are never pre-expanded into the index.

use regex::Regex;

/// Hierarchical scope prefix match, case-insensitive.
///
/// True when `stored_key == pattern` or `stored_key` is a `/`-delimited
/// descendant of `pattern`. `auth` matches `auth`, `auth/login`, and
/// `auth/login/flow`, but not `authn`.
#[must_use]
pub fn scope_matches(stored_key: &str, pattern: &str) -> bool {
    let key = stored_key.to_lowercase();
    let pattern = pattern.to_lowercase();
    key == pattern || key.starts_with(&format!("{pattern}/"))
}

/// Word-boundary keyword match, case-insensitive.
///
/// The keyword is regex-escaped before being bounded by `\b`, so keywords
/// containing regex metacharacters match literally.
#[must_use]
pub fn word_boundary_match(text: &str, keyword: &str) -> bool {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(text))
}
