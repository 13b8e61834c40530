//! Working-memory model types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current working-memory file schema version.
pub const WORKING_MEMORY_VERSION: u32 = 1;

/// Tag classifying a working-memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTag {
    /// Something observed to be true.
    Finding,
    /// Something suspected but unverified.
    Hypothesis,
    /// A choice that was made.
    Decision,
    /// Background the session needs.
    Context,
    /// Work still to do.
    Todo,
}

impl EntryTag {
    /// All tags, in summary-section order after `Decision`.
    pub const ALL: [Self; 5] = [
        Self::Finding,
        Self::Hypothesis,
        Self::Decision,
        Self::Context,
        Self::Todo,
    ];

    /// Parses a tag token.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "finding" => Some(Self::Finding),
            "hypothesis" => Some(Self::Hypothesis),
            "decision" => Some(Self::Decision),
            "context" => Some(Self::Context),
            "todo" => Some(Self::Todo),
            _ => None,
        }
    }

    /// The lowercase tag token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Finding => "finding",
            Self::Hypothesis => "hypothesis",
            Self::Decision => "decision",
            Self::Context => "context",
            Self::Todo => "todo",
        }
    }
}

impl fmt::Display for EntryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tagged entry in working memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    /// When the entry was appended, ISO 8601.
    pub timestamp: String,
    /// The entry tag.
    pub tag: EntryTag,
    /// Scope labels the entry applies to.
    #[serde(default)]
    pub scope: Vec<String>,
    /// The entry text.
    pub text: String,
    /// Where the entry came from (a file, a command, a hook).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Per-session append-only scratch log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingMemory {
    /// Schema version.
    pub version: u32,
    /// The owning session id (`YYYY-MM-DD/slug`).
    pub session_id: String,
    /// Creation timestamp, ISO 8601.
    pub created: String,
    /// Last-update timestamp, ISO 8601.
    pub updated: String,
    /// Entries in append order.
    pub entries: Vec<MemoryEntry>,
}

impl WorkingMemory {
    /// Creates an empty working memory for a session.
    #[must_use]
    pub fn new(session_id: impl Into<String>, now: impl Into<String>) -> Self {
        let now = now.into();
        Self {
            version: WORKING_MEMORY_VERSION,
            session_id: session_id.into(),
            created: now.clone(),
            updated: now,
            entries: Vec::new(),
        }
    }
}
