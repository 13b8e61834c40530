//! Post-tool hook.
//!
//! Watches the shell commands the agent runs. When a command is a
//! `gitrecall query …` invocation, the hook re-runs the query against the
//! index and injects the full context block — subjects plus decided-against
//! rationale — alongside whatever the command itself printed. Every other
//! command produces no output, keeping this (often `async`-configured) hook
//! quiet.

use super::{HookEnvelope, HookHandler};
use crate::Result;
use crate::git::GitRepo;
use crate::index::{QueryParams, TrailerIndex};
use crate::models::{IndexedCommit, Intent};

/// Handles `PostToolUse` events.
#[derive(Debug, Default)]
pub struct PostToolUseHandler {
    repo: Option<GitRepo>,
}

impl PostToolUseHandler {
    /// Creates a handler that discovers the repository from the cwd.
    #[must_use]
    pub const fn new() -> Self {
        Self { repo: None }
    }

    /// Pins the handler to a repository (tests).
    #[must_use]
    pub fn with_repo(mut self, repo: GitRepo) -> Self {
        self.repo = Some(repo);
        self
    }

    fn repo(&self) -> Option<GitRepo> {
        self.repo.clone().or_else(|| GitRepo::discover().ok())
    }
}

impl HookHandler for PostToolUseHandler {
    fn event_type(&self) -> &'static str {
        "PostToolUse"
    }

    fn handle(&self, input: &str) -> Result<String> {
        let envelope = HookEnvelope::parse(input);
        let Some(params) = parse_query_command(&envelope.tool_input.command) else {
            return Ok(String::new());
        };
        let Some(repo) = self.repo() else {
            return Ok(String::new());
        };
        let Some(index) = TrailerIndex::load_fresh(&repo).ok().flatten() else {
            return Ok(String::new());
        };

        let commits = index.query(&params);
        if commits.is_empty() {
            return Ok(String::new());
        }
        Ok(format_query_block(&commits))
    }
}

/// Parses an agent-executed `gitrecall query …` command line into query
/// parameters. Returns `None` for anything else, including a bare `query`
/// with no filters.
#[must_use]
pub fn parse_query_command(command: &str) -> Option<QueryParams> {
    let mut tokens = command.split_whitespace();
    let program = tokens.next()?;
    if !(program == "gitrecall" || program.ends_with("/gitrecall")) {
        return None;
    }
    if tokens.next()? != "query" {
        return None;
    }

    let mut params = QueryParams::default();
    while let Some(flag) = tokens.next() {
        match flag {
            "--scope" => params.scope = Some(tokens.next()?.to_string()),
            "--intent" => {
                let intent = Intent::parse(tokens.next()?)?;
                params.intents.get_or_insert_with(Vec::new).push(intent);
            },
            "--session" => params.session = Some(tokens.next()?.to_string()),
            "--decided-against" => {
                params.decided_against = Some(tokens.next()?.trim_matches('"').to_string());
            },
            "--limit" => params.limit = Some(tokens.next()?.parse().ok()?),
            _ => return None,
        }
    }

    if params.is_unconstrained() {
        return None;
    }
    Some(params)
}

fn format_query_block(commits: &[&IndexedCommit]) -> String {
    let mut out = format!("<commit-query commits=\"{}\">\n", commits.len());
    for commit in commits {
        let short: String = commit.hash.chars().take(7).collect();
        out.push_str(&format!("- {short} {}", commit.subject));
        if !commit.scope.is_empty() {
            out.push_str(&format!(" [{}]", commit.scope.join(", ")));
        }
        if let Some(session) = &commit.session {
            out.push_str(&format!(" {{{session}}}"));
        }
        out.push('\n');
        for rejected in &commit.decided_against {
            out.push_str(&format!("  decided against: {rejected}\n"));
        }
    }
    out.push_str("</commit-query>");
    out
}
