//! Commit-message validation.
//!
//! A pure function from raw message text to diagnostics. Trailer
//! recognition is shared with the parser, so a message whose trailers run
//! directly into the body fails here with `intent-required` /
//! `scope-required` rather than a formatting hint.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Diagnostic, Intent};
use crate::trailers::{parse_header, split_trailers};

/// Maximum header length.
const MAX_HEADER_LENGTH: usize = 72;

/// Maximum scope entries before a warning.
const MAX_SCOPE_ENTRIES: usize = 3;

static SESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}/.+$").expect("static regex: session id"));

/// Validates a raw commit message and returns all findings.
///
/// Never fails; an empty result means the message is clean.
#[must_use]
pub fn validate_message(message: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let mut lines = message.lines();
    let header = lines.next().unwrap_or("");
    let rest: String = lines.collect::<Vec<_>>().join("\n");

    if header.chars().count() > MAX_HEADER_LENGTH {
        diagnostics.push(Diagnostic::error(
            "header-max-length",
            format!(
                "header is {} chars (max {MAX_HEADER_LENGTH})",
                header.chars().count()
            ),
        ));
    }

    let parsed_header = parse_header(header);
    if parsed_header.is_none() {
        diagnostics.push(Diagnostic::error(
            "header-format",
            "header must match `type(scope)?: subject` with a known type",
        ));
    }

    if let Some((commit_type, _, subject)) = &parsed_header {
        if subject.ends_with('.') {
            diagnostics.push(Diagnostic::warning(
                "subject-period",
                "subject ends with a period",
            ));
        }
        if let Some(first_word) = subject.split_whitespace().next() {
            let lower = first_word.to_lowercase();
            if lower.ends_with("ed") || lower.ends_with("ing") {
                diagnostics.push(Diagnostic::warning(
                    "subject-imperative",
                    format!("subject should use imperative mood, got '{first_word}'"),
                ));
            }
        }

        let (body, _) = split_trailers(&rest);
        if body.trim().is_empty() && !commit_type.body_optional() {
            diagnostics.push(Diagnostic::warning(
                "body-required",
                format!("a body is expected for type '{commit_type}'"),
            ));
        }
    }

    validate_trailers(&rest, &mut diagnostics);
    diagnostics
}

fn validate_trailers(rest: &str, diagnostics: &mut Vec<Diagnostic>) {
    let (_, trailers) = split_trailers(rest);

    let intents: Vec<&str> = trailers
        .iter()
        .filter(|t| t.key == "intent")
        .map(|t| t.value.as_str())
        .collect();
    match intents.as_slice() {
        [] => diagnostics.push(Diagnostic::error(
            "intent-required",
            "exactly one Intent trailer is required",
        )),
        [value] => {
            if Intent::parse(value).is_none() {
                diagnostics.push(Diagnostic::error(
                    "intent-invalid",
                    format!("'{value}' is not in the intent vocabulary"),
                ));
            }
        },
        _ => diagnostics.push(Diagnostic::error(
            "intent-duplicate",
            format!("{} Intent trailers found, expected one", intents.len()),
        )),
    }

    let scope_entries: Vec<String> = trailers
        .iter()
        .filter(|t| t.key == "scope")
        .flat_map(|t| t.value.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if scope_entries.is_empty() {
        diagnostics.push(Diagnostic::error(
            "scope-required",
            "at least one Scope trailer is required",
        ));
    } else {
        if scope_entries.len() > MAX_SCOPE_ENTRIES {
            diagnostics.push(Diagnostic::warning(
                "scope-max-entries",
                format!(
                    "{} scope entries (max {MAX_SCOPE_ENTRIES}); split the commit or prune",
                    scope_entries.len()
                ),
            ));
        }
        for entry in &scope_entries {
            if !entry.contains('/') {
                diagnostics.push(Diagnostic::warning(
                    "scope-format",
                    format!("scope '{entry}' has no module part (expected domain/module)"),
                ));
            }
        }
    }

    for trailer in trailers.iter().filter(|t| t.key == "session") {
        if !SESSION_RE.is_match(&trailer.value) {
            diagnostics.push(Diagnostic::warning(
                "session-format",
                format!("session '{}' should be YYYY-MM-DD/slug", trailer.value),
            ));
        }
    }

    for trailer in trailers.iter().filter(|t| t.key == "context") {
        let parsed = serde_json::from_str::<serde_json::Value>(&trailer.value);
        if !parsed.as_ref().is_ok_and(serde_json::Value::is_object) {
            diagnostics.push(Diagnostic::error(
                "context-json",
                "Context trailer must be a JSON object",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn rules(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.rule.as_str()).collect()
    }

    const CLEAN: &str = "fix(auth): reject expired refresh tokens\n\n\
        Tokens past their expiry were still accepted by the middleware.\n\n\
        Intent: fix-defect\n\
        Scope: auth/tokens\n\
        Session: 2026-02-03/token-expiry";

    #[test]
    fn test_clean_message_has_no_diagnostics() {
        assert!(validate_message(CLEAN).is_empty());
    }

    #[test]
    fn test_header_too_long() {
        let header = format!("feat(auth): {}", "x".repeat(80));
        let message = format!("{header}\n\nBody.\n\nIntent: explore\nScope: auth/login");
        let diags = validate_message(&message);
        assert!(rules(&diags).contains(&"header-max-length"));
    }

    #[test]
    fn test_header_format_and_missing_trailers() {
        let diags = validate_message("updated the thing");
        let rules = rules(&diags);
        assert!(rules.contains(&"header-format"));
        assert!(rules.contains(&"intent-required"));
        assert!(rules.contains(&"scope-required"));
    }

    #[test]
    fn test_subject_period_and_mood_warnings() {
        let message = "fix(auth): fixed the login bug.\n\nBody.\n\n\
            Intent: fix-defect\nScope: auth/login";
        let diags = validate_message(message);
        let rules = rules(&diags);
        assert!(rules.contains(&"subject-period"));
        assert!(rules.contains(&"subject-imperative"));
        assert!(diags.iter().all(|d| d.severity == Severity::Warning));
    }

    #[test]
    fn test_body_optional_for_chore() {
        let chore = "chore: bump deps\n\nIntent: configure-infra\nScope: build/deps";
        assert!(validate_message(chore).is_empty());

        let feat = "feat(api): add thing\n\nIntent: enable-capability\nScope: api/thing";
        let diags = validate_message(feat);
        assert!(rules(&diags).contains(&"body-required"));
    }

    #[test]
    fn test_scope_entry_warnings() {
        let message = "refactor(core): split modules\n\nBody.\n\n\
            Intent: restructure\n\
            Scope: auth, backend, orders/pricing, billing";
        let diags = validate_message(message);
        let rules = rules(&diags);
        assert!(rules.contains(&"scope-max-entries"));
        assert_eq!(
            rules.iter().filter(|r| **r == "scope-format").count(),
            3,
            "auth, backend and billing lack a module part"
        );
    }

    #[test]
    fn test_intent_rules() {
        let none = "fix(a): b\n\nBody.\n\nScope: a/b";
        assert!(rules(&validate_message(none)).contains(&"intent-required"));

        let bad = "fix(a): b\n\nBody.\n\nIntent: improve\nScope: a/b";
        assert!(rules(&validate_message(bad)).contains(&"intent-invalid"));

        let twice = "fix(a): b\n\nBody.\n\nIntent: fix-defect\nIntent: explore\nScope: a/b";
        assert!(rules(&validate_message(twice)).contains(&"intent-duplicate"));
    }

    #[test]
    fn test_session_format_warning() {
        let message = "fix(a): b\n\nBody.\n\n\
            Intent: fix-defect\nScope: a/b\nSession: monday-session";
        assert!(rules(&validate_message(message)).contains(&"session-format"));
    }

    #[test]
    fn test_context_must_be_json_object() {
        let bad = "fix(a): b\n\nBody.\n\n\
            Intent: fix-defect\nScope: a/b\nContext: {broken";
        assert!(rules(&validate_message(bad)).contains(&"context-json"));

        let array = "fix(a): b\n\nBody.\n\n\
            Intent: fix-defect\nScope: a/b\nContext: [1, 2]";
        assert!(rules(&validate_message(array)).contains(&"context-json"));

        let good = "fix(a): b\n\nBody.\n\n\
            Intent: fix-defect\nScope: a/b\nContext: {\"k\": 1}";
        assert!(!rules(&validate_message(good)).contains(&"context-json"));
    }

    #[test]
    fn test_unseparated_trailers_degrade_to_required_errors() {
        let message = "fix(a): b\n\nBody text\nIntent: fix-defect\nScope: a/b";
        let diags = validate_message(message);
        let rules = rules(&diags);
        assert!(rules.contains(&"intent-required"));
        assert!(rules.contains(&"scope-required"));
    }
}
