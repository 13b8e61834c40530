//! Commit trailer parsing.
//!
//! Splits a raw commit record into header, body, and typed trailers.
//!
//! Trailer detection scans the message backwards and is gated on a
//! known-keys allow-list: a trailer is never recognized by shape alone, so a
//! body line such as `WEBHOOK_URL: https://…` stays in the body. The trailer
//! block must also be separated from the body by a blank line; trailers that
//! run directly into body text are not recognized at all.

mod validator;

pub use validator::validate_message;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::git::COMMIT_SEPARATOR;
use crate::models::{CommitType, Intent, StructuredCommit};
use crate::{Error, Result};

/// Trailer keys recognized during backward scanning, lowercased.
pub const KNOWN_TRAILER_KEYS: [&str; 9] = [
    "intent",
    "scope",
    "decided-against",
    "session",
    "refs",
    "context",
    "breaking",
    "signed-off-by",
    "co-authored-by",
];

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(feat|fix|refactor|perf|docs|test|build|ci|chore|revert)(?:\(([^)]+)\))?!?:\s+(.+)$",
    )
    .expect("static regex: conventional header")
});

static TRAILER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z-]*):\s?(.*)$").expect("static regex: trailer line")
});

/// One raw `Key: value` trailer line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailer {
    /// The key, lowercased.
    pub key: String,
    /// The value, case preserved.
    pub value: String,
}

/// Parses the conventional-commit header.
///
/// Returns `(type, header_scope, subject)` or `None` when the header does
/// not match.
#[must_use]
pub fn parse_header(subject: &str) -> Option<(CommitType, Option<String>, String)> {
    let caps = HEADER_RE.captures(subject)?;
    let commit_type = CommitType::parse(caps.get(1)?.as_str())?;
    let header_scope = caps.get(2).map(|m| m.as_str().to_string());
    let text = caps.get(3)?.as_str().to_string();
    Some((commit_type, header_scope, text))
}

fn parse_trailer_line(line: &str) -> Option<Trailer> {
    let caps = TRAILER_LINE_RE.captures(line)?;
    let key = caps.get(1)?.as_str().to_lowercase();
    if !KNOWN_TRAILER_KEYS.contains(&key.as_str()) {
        return None;
    }
    Some(Trailer {
        key,
        value: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
    })
}

/// Splits a commit message (body and trailers, header excluded) into the
/// body text and the recognized trailer lines.
///
/// The trailer block is the last contiguous run of known-key `Key: value`
/// lines, optionally containing blank lines whose preceding line is itself a
/// recognized trailer (structured trailers, a blank, then `Co-Authored-By:`
/// is one block). Any other blank line, or any unrecognized line, ends the
/// scan; a trailer block not preceded by a blank line (or message start) is
/// not a trailer block at all.
#[must_use]
pub fn split_trailers(message: &str) -> (String, Vec<Trailer>) {
    let mut lines: Vec<&str> = message.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    // Backward scan for the start of the trailer block.
    let mut start = lines.len();
    let mut i = lines.len();
    while i > 0 {
        let line = lines[i - 1];
        if line.trim().is_empty() {
            // tolerated only between recognized trailer lines
            if start < lines.len() && i >= 2 && parse_trailer_line(lines[i - 2]).is_some() {
                i -= 1;
                continue;
            }
            break;
        }
        if parse_trailer_line(line).is_some() {
            start = i - 1;
            i -= 1;
        } else {
            break;
        }
    }

    // The block must be separated from the body by a blank line.
    if start < lines.len() && start > 0 && !lines[start - 1].trim().is_empty() {
        start = lines.len();
    }

    let trailers: Vec<Trailer> = lines[start..]
        .iter()
        .filter_map(|line| parse_trailer_line(line))
        .collect();

    let mut body_lines = &lines[..start];
    while body_lines.last().is_some_and(|l| l.trim().is_empty()) {
        body_lines = &body_lines[..body_lines.len() - 1];
    }

    (body_lines.join("\n"), trailers)
}

/// Splits comma-separated trailer values, trimming each entry.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Splits `git log` batch output into per-commit record blocks.
pub fn split_records(text: &str) -> impl Iterator<Item = &str> {
    text.split(COMMIT_SEPARATOR)
        .map(|block| block.trim_matches(['\n', '\r']))
        .filter(|block| !block.trim().is_empty())
}

/// Parses one commit record block into a [`StructuredCommit`].
///
/// # Errors
///
/// Returns [`Error::MissingRequiredFields`] when Hash, Date, or Subject are
/// absent, and [`Error::NonConventionalSubject`] when the header regex does
/// not match.
pub fn parse_record(block: &str) -> Result<StructuredCommit> {
    let mut hash = None;
    let mut date = None;
    let mut subject = None;
    let mut message_start = 0;

    for (consumed, line) in block.lines().enumerate() {
        if let Some(rest) = line.strip_prefix("Hash: ") {
            hash = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Date: ") {
            date = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Subject: ") {
            subject = Some(rest.to_string());
            // the remainder of the block is body and trailers
            message_start = consumed + 1;
            break;
        } else if !line.trim().is_empty() {
            break;
        }
    }

    let mut missing = Vec::new();
    if hash.is_none() {
        missing.push("Hash");
    }
    if date.is_none() {
        missing.push("Date");
    }
    if subject.is_none() {
        missing.push("Subject");
    }
    if !missing.is_empty() {
        return Err(Error::MissingRequiredFields(missing.join(", ")));
    }

    let hash = hash.unwrap_or_default();
    let date = date.unwrap_or_default();
    let subject = subject.unwrap_or_default();

    let (commit_type, header_scope, subject_text) =
        parse_header(&subject).ok_or_else(|| Error::NonConventionalSubject(subject.clone()))?;

    let message: String = block
        .lines()
        .skip(message_start)
        .collect::<Vec<_>>()
        .join("\n");
    let (body, trailers) = split_trailers(&message);

    let mut commit = StructuredCommit {
        hash,
        date,
        commit_type,
        header_scope,
        subject: subject_text,
        body,
        intent: None,
        scope: Vec::new(),
        decided_against: Vec::new(),
        session: None,
        refs: Vec::new(),
        context: None,
        breaking: None,
    };

    for trailer in trailers {
        match trailer.key.as_str() {
            "intent" => {
                if commit.intent.is_none() {
                    commit.intent = Intent::parse(&trailer.value);
                }
            },
            "scope" => commit.scope.extend(split_list(&trailer.value)),
            "decided-against" => {
                if !trailer.value.is_empty() {
                    commit.decided_against.push(trailer.value);
                }
            },
            "session" => {
                if commit.session.is_none() && !trailer.value.is_empty() {
                    commit.session = Some(trailer.value);
                }
            },
            "refs" => commit.refs.extend(split_list(&trailer.value)),
            "context" => {
                if commit.context.is_none() {
                    commit.context =
                        serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&trailer.value)
                            .ok();
                }
            },
            "breaking" => {
                if commit.breaking.is_none() && !trailer.value.is_empty() {
                    commit.breaking = Some(trailer.value);
                }
            },
            // signed-off-by / co-authored-by are recognized but untyped
            _ => {},
        }
    }

    Ok(commit)
}

/// Serializes a [`StructuredCommit`] back into the record format.
///
/// Used by tests and the `git log --grep` fallback path to keep parsing
/// round-trippable.
#[must_use]
pub fn serialize_record(commit: &StructuredCommit) -> String {
    let mut out = String::new();
    out.push_str(&format!("Hash: {}\n", commit.hash));
    out.push_str(&format!("Date: {}\n", commit.date));
    let scope = commit
        .header_scope
        .as_ref()
        .map(|s| format!("({s})"))
        .unwrap_or_default();
    out.push_str(&format!(
        "Subject: {}{}: {}\n",
        commit.commit_type, scope, commit.subject
    ));
    if !commit.body.is_empty() {
        out.push_str(&commit.body);
        out.push('\n');
    }
    out.push('\n');
    if let Some(intent) = commit.intent {
        out.push_str(&format!("Intent: {intent}\n"));
    }
    if !commit.scope.is_empty() {
        out.push_str(&format!("Scope: {}\n", commit.scope.join(", ")));
    }
    for rejected in &commit.decided_against {
        out.push_str(&format!("Decided-Against: {rejected}\n"));
    }
    if let Some(session) = &commit.session {
        out.push_str(&format!("Session: {session}\n"));
    }
    if !commit.refs.is_empty() {
        out.push_str(&format!("Refs: {}\n", commit.refs.join(", ")));
    }
    if let Some(context) = &commit.context
        && let Ok(json) = serde_json::to_string(context)
    {
        out.push_str(&format!("Context: {json}\n"));
    }
    if let Some(breaking) = &commit.breaking {
        out.push_str(&format!("Breaking: {breaking}\n"));
    }
    out
}
