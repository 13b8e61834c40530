//! Commit model types.
//!
//! [`StructuredCommit`] is the fully parsed form of one commit record;
//! [`IndexedCommit`] is the compact form stored inside the trailer index.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of conventional-commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    /// A new capability.
    Feat,
    /// A defect fix.
    Fix,
    /// A behavior-preserving restructure.
    Refactor,
    /// A performance change.
    Perf,
    /// Documentation only.
    Docs,
    /// Test changes.
    Test,
    /// Build system changes.
    Build,
    /// CI configuration changes.
    Ci,
    /// Maintenance work.
    Chore,
    /// A revert of an earlier commit.
    Revert,
}

impl CommitType {
    /// All commit types, in header-regex order.
    pub const ALL: [Self; 10] = [
        Self::Feat,
        Self::Fix,
        Self::Refactor,
        Self::Perf,
        Self::Docs,
        Self::Test,
        Self::Build,
        Self::Ci,
        Self::Chore,
        Self::Revert,
    ];

    /// Parses a commit type token.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "feat" => Some(Self::Feat),
            "fix" => Some(Self::Fix),
            "refactor" => Some(Self::Refactor),
            "perf" => Some(Self::Perf),
            "docs" => Some(Self::Docs),
            "test" => Some(Self::Test),
            "build" => Some(Self::Build),
            "ci" => Some(Self::Ci),
            "chore" => Some(Self::Chore),
            "revert" => Some(Self::Revert),
            _ => None,
        }
    }

    /// The lowercase token used in commit headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Refactor => "refactor",
            Self::Perf => "perf",
            Self::Docs => "docs",
            Self::Test => "test",
            Self::Build => "build",
            Self::Ci => "ci",
            Self::Chore => "chore",
            Self::Revert => "revert",
        }
    }

    /// Whether a body is optional for this type.
    #[must_use]
    pub const fn body_optional(self) -> bool {
        matches!(self, Self::Chore | Self::Ci | Self::Build)
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The controlled vocabulary of strategic commit intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    /// Adds a capability the system did not have.
    EnableCapability,
    /// Corrects incorrect behavior.
    FixDefect,
    /// Raises quality without changing behavior.
    ImproveQuality,
    /// Rearranges structure to enable future work.
    Restructure,
    /// Changes infrastructure or tooling configuration.
    ConfigureInfra,
    /// Records knowledge.
    Document,
    /// Investigates an approach without committing to it.
    Explore,
    /// Removes an impediment to other work.
    ResolveBlocker,
}

impl Intent {
    /// All intents, in vocabulary order.
    pub const ALL: [Self; 8] = [
        Self::EnableCapability,
        Self::FixDefect,
        Self::ImproveQuality,
        Self::Restructure,
        Self::ConfigureInfra,
        Self::Document,
        Self::Explore,
        Self::ResolveBlocker,
    ];

    /// Parses an intent trailer value. Values outside the controlled
    /// vocabulary yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "enable-capability" => Some(Self::EnableCapability),
            "fix-defect" => Some(Self::FixDefect),
            "improve-quality" => Some(Self::ImproveQuality),
            "restructure" => Some(Self::Restructure),
            "configure-infra" => Some(Self::ConfigureInfra),
            "document" => Some(Self::Document),
            "explore" => Some(Self::Explore),
            "resolve-blocker" => Some(Self::ResolveBlocker),
            _ => None,
        }
    }

    /// The kebab-case trailer value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnableCapability => "enable-capability",
            Self::FixDefect => "fix-defect",
            Self::ImproveQuality => "improve-quality",
            Self::Restructure => "restructure",
            Self::ConfigureInfra => "configure-infra",
            Self::Document => "document",
            Self::Explore => "explore",
            Self::ResolveBlocker => "resolve-blocker",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parsed form of one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredCommit {
    /// The commit hash.
    pub hash: String,
    /// Author date, ISO 8601.
    pub date: String,
    /// Conventional commit type.
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    /// Optional scope from the header parentheses.
    pub header_scope: Option<String>,
    /// The subject text after the `type(scope):` prefix.
    pub subject: String,
    /// The message body, trailers excluded.
    pub body: String,
    /// The `Intent` trailer, if present and in-vocabulary.
    pub intent: Option<Intent>,
    /// The `Scope` trailer entries, comma-split and trimmed.
    pub scope: Vec<String>,
    /// The `Decided-Against` trailer entries.
    pub decided_against: Vec<String>,
    /// The `Session` trailer (`YYYY-MM-DD/slug`), if present.
    pub session: Option<String>,
    /// The `Refs` trailer entries.
    pub refs: Vec<String>,
    /// The `Context` trailer parsed as a JSON mapping, or `None` when absent
    /// or unparseable.
    pub context: Option<BTreeMap<String, Value>>,
    /// The `Breaking` trailer text, if present.
    pub breaking: Option<String>,
}

impl StructuredCommit {
    /// The compact form stored in the index.
    #[must_use]
    pub fn to_indexed(&self) -> IndexedCommit {
        IndexedCommit {
            hash: self.hash.clone(),
            date: self.date.clone(),
            subject: self.subject.clone(),
            intent: self.intent,
            scope: self.scope.clone(),
            session: self.session.clone(),
            decided_against: self.decided_against.clone(),
        }
    }
}

/// Compact commit record persisted inside the trailer index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedCommit {
    /// The commit hash.
    pub hash: String,
    /// Author date, ISO 8601.
    pub date: String,
    /// The subject text.
    pub subject: String,
    /// The commit's intent, if any.
    pub intent: Option<Intent>,
    /// Scope entries.
    #[serde(default)]
    pub scope: Vec<String>,
    /// Session id, if any.
    pub session: Option<String>,
    /// Decided-against entries.
    #[serde(default)]
    pub decided_against: Vec<String>,
}
