//! Property-based tests for the matching primitives, the argument
//! sanitizer, and parser round-trips.

// Property tests use expect/unwrap for simplicity
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use gitrecall::matching::{scope_matches, word_boundary_match};
use gitrecall::models::{CommitType, Intent, StructuredCommit};
use gitrecall::sandbox::{DANGEROUS_CHARS, sanitize_git_log_args};
use gitrecall::trailers::{parse_record, serialize_record};

fn scope_key() -> impl Strategy<Value = String> {
    "[a-z]{1,6}(/[a-z]{1,6}){0,2}"
}

proptest! {
    /// Property: `scope_matches` is exactly "equal or slash-descendant",
    /// case-insensitively.
    #[test]
    fn prop_scope_matches_reference(key in scope_key(), pattern in scope_key()) {
        let expected = key.to_lowercase() == pattern.to_lowercase()
            || key.to_lowercase().starts_with(&format!("{}/", pattern.to_lowercase()));
        prop_assert_eq!(scope_matches(&key, &pattern), expected);
    }

    /// Property: a pattern never matches a sibling that merely shares a
    /// string prefix.
    #[test]
    fn prop_scope_no_sibling_match(base in "[a-z]{1,6}", suffix in "[a-z]{1,4}") {
        let sibling = format!("{base}{suffix}");
        prop_assert!(!scope_matches(&sibling, &base));
        let child = format!("{base}/{suffix}");
        prop_assert!(scope_matches(&child, &base));
    }

    /// Property: an alphanumeric keyword always matches itself between
    /// word boundaries, never inside a longer word.
    #[test]
    fn prop_word_boundary(keyword in "[a-z0-9]{2,8}") {
        let padded = format!("before {keyword} after");
        prop_assert!(word_boundary_match(&padded, &keyword));
        let embedded = format!("x{keyword}y");
        prop_assert!(!word_boundary_match(&embedded, &keyword));
    }

    /// Property: sanitizer output never contains a dangerous character and
    /// any returned -n count is within 1..=50.
    #[test]
    fn prop_sanitizer_invariants(count in 1_u64..=5_000, grep in "[a-z]{0,12}") {
        let args = vec![
            "-n".to_string(),
            count.to_string(),
            format!("--grep={grep}"),
        ];
        let sanitized = sanitize_git_log_args(&args).unwrap();
        for arg in &sanitized {
            prop_assert!(!arg.chars().any(|c| DANGEROUS_CHARS.contains(&c)));
        }
        let n: u64 = sanitized[1].parse().unwrap();
        prop_assert!((1..=50).contains(&n));
    }

    /// Property: any argument carrying a dangerous character is rejected
    /// with the dangerous-character tag.
    #[test]
    fn prop_sanitizer_rejects_metacharacters(
        prefix in "[a-z]{0,6}",
        dangerous in prop::sample::select(&DANGEROUS_CHARS[..]),
        suffix in "[a-z]{0,6}",
    ) {
        let args = vec![format!("{prefix}{dangerous}{suffix}")];
        let err = sanitize_git_log_args(&args).unwrap_err();
        prop_assert_eq!(err.tag(), "dangerous-character");
    }
}

fn arbitrary_commit() -> impl Strategy<Value = StructuredCommit> {
    let commit_type = prop::sample::select(&CommitType::ALL[..]);
    let intent = prop::option::of(prop::sample::select(&Intent::ALL[..]));
    let subject = "[a-z][a-z ]{0,20}[a-z]";
    let body = prop::option::of("[a-z][a-z ]{0,30}[a-z]");
    let scope = prop::collection::vec("[a-z]{1,6}(/[a-z]{1,6})?", 1..3);
    let decided = prop::collection::vec("[a-z][a-z ]{0,15}[a-z]", 0..3);
    let session = prop::option::of("[a-z]{1,8}");
    let refs = prop::collection::vec("#[0-9]{1,4}", 0..3);

    (
        "[a-f0-9]{40}",
        commit_type,
        prop::option::of("[a-z]{1,8}"),
        subject,
        body,
        (intent, scope, decided, session, refs),
    )
        .prop_map(
            |(hash, commit_type, header_scope, subject, body, (intent, scope, decided, session, refs))| {
                StructuredCommit {
                    hash,
                    date: "2026-02-03T04:05:06+00:00".to_string(),
                    commit_type,
                    header_scope,
                    subject,
                    body: body.unwrap_or_default(),
                    intent,
                    scope,
                    decided_against: decided,
                    session: session.map(|slug| format!("2026-02-03/{slug}")),
                    refs,
                    context: None,
                    breaking: None,
                }
            },
        )
}

proptest! {
    /// Property: parse(serialize(commit)) round-trips every typed field.
    #[test]
    fn prop_record_roundtrip(commit in arbitrary_commit()) {
        let serialized = serialize_record(&commit);
        let reparsed = parse_record(&serialized).unwrap();
        prop_assert_eq!(reparsed, commit);
    }
}
