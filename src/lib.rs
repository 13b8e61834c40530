//! # gitrecall
//!
//! Commit-history memory for AI coding agents.
//!
//! gitrecall reads a project's `git log`, extracts a controlled vocabulary of
//! structured trailers (`Intent`, `Scope`, `Decided-Against`, `Session`,
//! `Context`, `Breaking`, `Refs`), builds an inverted index over them, and
//! injects prompt-relevant context into an agent at three lifecycle points:
//! prompt submit, post tool use, and session stop.
//!
//! The index can also be handed to a local LLM through a sandboxed
//! programmatic API (the RLM loop): the model writes short JavaScript
//! fragments that run in an isolated engine with strict budgets and a
//! message-channel-only boundary to the host.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gitrecall::{GitRepo, TrailerIndex, QueryParams};
//!
//! let repo = GitRepo::discover()?;
//! let index = TrailerIndex::build(&repo)?;
//! let commits = index.query(&QueryParams::default().with_scope("auth"));
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use std::error::Error as StdError;
use std::fmt;

pub mod config;
pub mod git;
pub mod hooks;
pub mod index;
pub mod llm;
pub mod matching;
pub mod memory;
pub mod models;
pub mod observability;
pub mod repl;
pub mod sandbox;
pub mod signals;
pub mod trailers;

// Re-exports for convenience
pub use config::RlmSettings;
pub use git::GitRepo;
pub use index::{QueryParams, TrailerIndex};
pub use llm::{ChatMessage, LlmClient};
pub use memory::WorkingMemoryStore;
pub use models::{
    CommitType, Diagnostic, EntryTag, IndexedCommit, Intent, MemoryEntry, PromptSignals, Severity,
    StructuredCommit, WorkingMemory,
};
pub use repl::{ReplConfig, ReplOutcome};
pub use sandbox::Sandbox;

/// Error type for gitrecall operations.
///
/// Every fallible operation across component boundaries returns this type;
/// [`Error::tag`] yields the stable kebab-case tag the CLI prints.
#[derive(Debug)]
pub enum Error {
    /// A commit record lacked Hash, Date, or Subject.
    MissingRequiredFields(String),
    /// The commit subject did not match the conventional-commit header.
    NonConventionalSubject(String),
    /// A git subprocess failed or produced undecodable output.
    GitLogFailed(String),
    /// A filesystem read or write failed.
    IoFailed {
        /// The path involved.
        path: String,
        /// The underlying cause.
        cause: String,
    },
    /// A sandbox execution exceeded its wall-clock timeout.
    SandboxExecutionTimedOut,
    /// A `gitLog` argument used a flag outside the allow-list.
    DisallowedFlag(String),
    /// A `-n` argument was missing, non-numeric, or out of range.
    InvalidN(String),
    /// A `gitLog` argument contained a shell metacharacter.
    DangerousCharacter(String),
    /// The REPL's LLM call budget is consumed.
    LlmBudgetExhausted,
    /// An operation failed.
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// The stable kebab-case tag for this error kind.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::MissingRequiredFields(_) => "missing-required-fields",
            Self::NonConventionalSubject(_) => "non-conventional-subject",
            Self::GitLogFailed(_) => "git-log-failed",
            Self::IoFailed { .. } => "io-failed",
            Self::SandboxExecutionTimedOut => "sandbox-execution-timed-out",
            Self::DisallowedFlag(_) => "disallowed-flag",
            Self::InvalidN(_) => "invalid-n",
            Self::DangerousCharacter(_) => "dangerous-character",
            Self::LlmBudgetExhausted => "llm-budget-exhausted",
            Self::OperationFailed { .. } => "operation-failed",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredFields(missing) => {
                write!(f, "commit record missing required fields: {missing}")
            },
            Self::NonConventionalSubject(subject) => {
                write!(f, "subject is not a conventional commit header: {subject}")
            },
            Self::GitLogFailed(cause) => write!(f, "git log failed: {cause}"),
            Self::IoFailed { path, cause } => write!(f, "io failed for {path}: {cause}"),
            Self::SandboxExecutionTimedOut => write!(f, "sandbox execution timed out"),
            Self::DisallowedFlag(flag) => write!(f, "git log flag not allowed: {flag}"),
            Self::InvalidN(arg) => write!(f, "invalid -n argument: {arg}"),
            Self::DangerousCharacter(arg) => {
                write!(f, "argument contains a dangerous character: {arg}")
            },
            Self::LlmBudgetExhausted => write!(f, "llm call budget exhausted"),
            Self::OperationFailed { operation, cause } => {
                write!(f, "operation '{operation}' failed: {cause}")
            },
        }
    }
}

impl StdError for Error {}

/// Result type alias for gitrecall operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::GitLogFailed("exit status 128".to_string());
        assert_eq!(err.to_string(), "git log failed: exit status 128");

        let err = Error::OperationFailed {
            operation: "ollama_request".to_string(),
            cause: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'ollama_request' failed: connection refused"
        );
    }

    #[test]
    fn test_error_tags_are_kebab_case() {
        let errors = [
            Error::MissingRequiredFields(String::new()),
            Error::NonConventionalSubject(String::new()),
            Error::GitLogFailed(String::new()),
            Error::IoFailed {
                path: String::new(),
                cause: String::new(),
            },
            Error::SandboxExecutionTimedOut,
            Error::DisallowedFlag(String::new()),
            Error::InvalidN(String::new()),
            Error::DangerousCharacter(String::new()),
            Error::LlmBudgetExhausted,
            Error::OperationFailed {
                operation: String::new(),
                cause: String::new(),
            },
        ];
        for err in errors {
            let tag = err.tag();
            assert!(!tag.is_empty());
            assert!(
                tag.chars().all(|c| c.is_ascii_lowercase() || c == '-'),
                "tag {tag} is not kebab-case"
            );
        }
    }
}
