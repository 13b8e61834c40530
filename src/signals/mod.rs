//! Prompt signal extraction.
//!
//! Classifies the tokens of a user prompt into scope hints (tokens that
//! match a stored scope key), intent hints (synonym-table hits), and
//! residual keywords. Detection is pure string work; typical prompts
//! classify in well under a millisecond.

mod vocab;

pub use vocab::{INTENT_SYNONYMS, STOP_WORDS};

use crate::matching::scope_matches;
use crate::models::PromptSignals;

/// Extracts [`PromptSignals`] from one user prompt.
///
/// Tokenization lowercases, keeps `[a-z0-9/_-]`, splits on whitespace, and
/// drops tokens of length ≤ 1. A token that matches a stored scope key or an
/// intent synonym is consumed and never reappears as a keyword. All three
/// collections de-duplicate preserving first-seen order.
#[must_use]
pub fn extract_prompt_signals(prompt: &str, scope_keys: &[String]) -> PromptSignals {
    let mut signals = PromptSignals::default();

    for token in tokenize(prompt) {
        let mut consumed = false;

        if scope_keys.iter().any(|key| scope_matches(key, &token)) {
            if !signals.scope_hints.contains(&token) {
                signals.scope_hints.push(token.clone());
            }
            consumed = true;
        }

        if let Some(intent) = INTENT_SYNONYMS.get(token.as_str()) {
            consumed = true;
            if !signals.intent_hints.contains(intent) {
                signals.intent_hints.push(*intent);
            }
        }

        if !consumed && !STOP_WORDS.contains(token.as_str()) && !signals.keywords.contains(&token)
        {
            signals.keywords.push(token);
        }
    }

    signals
}

fn tokenize(prompt: &str) -> impl Iterator<Item = String> + '_ {
    prompt
        .split_whitespace()
        .map(|word| {
            word.to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "/_-".contains(*c))
                .collect::<String>()
        })
        .filter(|token| token.chars().count() > 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intent;

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_scenario_auth_login_bug() {
        let signals = extract_prompt_signals(
            "fix the AUTH login bug",
            &keys(&["auth", "auth/login", "cache"]),
        );
        assert_eq!(signals.scope_hints, vec!["auth"]);
        assert_eq!(signals.intent_hints, vec![Intent::FixDefect]);
        assert_eq!(signals.keywords, vec!["login"]);
    }

    #[test]
    fn test_empty_prompt_yields_empty_signals() {
        let signals = extract_prompt_signals("   \t\n ", &keys(&["auth"]));
        assert!(signals.is_empty());
    }

    #[test]
    fn test_short_tokens_dropped() {
        let signals = extract_prompt_signals("a b c db", &keys(&[]));
        assert_eq!(signals.keywords, vec!["db"]);
    }

    #[test]
    fn test_punctuation_stripped_from_tokens() {
        let signals = extract_prompt_signals("what's wrong with (cache)?", &keys(&["cache"]));
        assert_eq!(signals.scope_hints, vec!["cache"]);
        // "wrong" is an intent synonym, "whats"/"with" are residual/stop
        assert_eq!(signals.intent_hints, vec![Intent::FixDefect]);
        assert!(!signals.keywords.contains(&"cache".to_string()));
    }

    #[test]
    fn test_hierarchical_token_matches_stored_child() {
        // the token "auth/login" matches the stored key "auth/login/flow"
        let signals =
            extract_prompt_signals("investigate auth/login timeout", &keys(&["auth/login/flow"]));
        assert_eq!(signals.scope_hints, vec!["auth/login"]);
        assert_eq!(signals.intent_hints, vec![Intent::Explore]);
        assert_eq!(signals.keywords, vec!["timeout"]);
    }

    #[test]
    fn test_duplicates_deduplicated_in_order() {
        let signals = extract_prompt_signals(
            "cache cache miss then another miss",
            &keys(&["cache"]),
        );
        assert_eq!(signals.scope_hints, vec!["cache"]);
        assert_eq!(signals.keywords, vec!["miss", "another"]);
    }

    #[test]
    fn test_token_consumed_by_both_scope_and_intent() {
        // "docs" is both a stored scope key and a document-intent synonym
        let signals = extract_prompt_signals("update docs index", &keys(&["docs"]));
        assert_eq!(signals.scope_hints, vec!["docs"]);
        assert_eq!(signals.intent_hints, vec![Intent::Document]);
        assert!(!signals.keywords.contains(&"docs".to_string()));
    }
}
