//! Prompt-submit hook.
//!
//! Extracts signals from the submitted prompt, pulls matching commits from
//! the trailer index (or the live `git log --grep` fallback when the index
//! is stale), appends the session's working memory, and — when enabled —
//! lets the RLM loop analyze the prompt against the index.

use std::sync::Arc;

use super::{HookEnvelope, HookHandler, derive_session_id};
use crate::config::RlmSettings;
use crate::git::GitRepo;
use crate::index::{QueryParams, TrailerIndex, live_grep};
use crate::llm::{LlmClient, OllamaClient};
use crate::memory::WorkingMemoryStore;
use crate::models::{IndexedCommit, PromptSignals};
use crate::repl::run_repl;
use crate::sandbox::SandboxEnv;
use crate::signals::extract_prompt_signals;
use crate::Result;

/// Cap on commits injected into the agent's context.
const MAX_INJECTED_COMMITS: usize = 10;

/// Handles `UserPromptSubmit` events.
#[derive(Debug, Default)]
pub struct UserPromptHandler {
    repo: Option<GitRepo>,
}

impl UserPromptHandler {
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

impl HookHandler for UserPromptHandler {
    fn event_type(&self) -> &'static str {
        "UserPromptSubmit"
    }

    fn handle(&self, input: &str) -> Result<String> {
        let envelope = HookEnvelope::parse(input);
        let prompt = envelope.prompt.trim().to_string();
        if prompt.is_empty() {
            return Ok(String::new());
        }
        let Some(repo) = self.repo() else {
            return Ok(String::new());
        };

        let mut sections: Vec<String> = Vec::new();
        let index = TrailerIndex::load_fresh(&repo).ok().flatten();

        match &index {
            Some(index) => {
                let signals = extract_prompt_signals(&prompt, &index.scope_keys());
                let commits = gather_commits(index, &signals);
                if !commits.is_empty() {
                    sections.push(format_commit_block(&commits));
                }
            },
            None => {
                // stale or missing index: grep live history for the keywords
                let signals = extract_prompt_signals(&prompt, &[]);
                let patterns: Vec<String> =
                    signals.keywords.iter().take(3).cloned().collect();
                if let Ok(commits) = live_grep(&repo, &patterns, MAX_INJECTED_COMMITS) {
                    let refs: Vec<&IndexedCommit> = commits.iter().collect();
                    if !refs.is_empty() {
                        sections.push(format_commit_block(&refs));
                    }
                }
            },
        }

        let session_id = derive_session_id(&envelope);
        let memory = WorkingMemoryStore::new(&repo, &session_id)
            .load()
            .ok()
            .flatten();
        if let Some(memory) = memory.as_ref().filter(|m| !m.entries.is_empty()) {
            sections.push(WorkingMemoryStore::format_block(memory, None));
        }

        if let Some(index) = index {
            let settings = RlmSettings::load(&repo).unwrap_or_default();
            if settings.enabled && settings.repl_enabled {
                match run_rlm(&repo, &settings, index, memory, &prompt) {
                    Ok(answer) if !answer.trim().is_empty() => {
                        sections.push(format!(
                            "<rlm-analysis>\n{}\n</rlm-analysis>",
                            answer.trim()
                        ));
                    },
                    Ok(_) => {},
                    Err(e) => tracing::warn!(error = %e, "rlm analysis failed"),
                }
            }
        }

        Ok(sections.join("\n\n"))
    }
}

fn run_rlm(
    repo: &GitRepo,
    settings: &RlmSettings,
    index: TrailerIndex,
    memory: Option<crate::models::WorkingMemory>,
    prompt: &str,
) -> Result<String> {
    let client = OllamaClient::from_settings(settings)?
        .with_max_tokens(settings.repl_max_output_tokens);
    let llm: Arc<dyn LlmClient> = Arc::new(client);
    let env = SandboxEnv::new(index, memory);
    let git_repo = repo.clone();
    let outcome = run_repl(
        &llm,
        env,
        prompt,
        &settings.repl_config(),
        Box::new(move |args| git_repo.log_with_args(args)),
    )?;
    tracing::info!(
        iterations = outcome.iterations,
        llm_calls = outcome.llm_calls,
        "rlm analysis complete"
    );
    Ok(outcome.answer)
}

/// Queries the index along each extracted signal dimension and merges the
/// results, preserving first-seen order.
fn gather_commits<'a>(index: &'a TrailerIndex, signals: &PromptSignals) -> Vec<&'a IndexedCommit> {
    fn push_unique<'a>(found: Vec<&'a IndexedCommit>, commits: &mut Vec<&'a IndexedCommit>) {
        for commit in found {
            if !commits.iter().any(|c| c.hash == commit.hash) {
                commits.push(commit);
            }
        }
    }

    let mut commits: Vec<&IndexedCommit> = Vec::new();

    for scope in &signals.scope_hints {
        let found = index.query(&QueryParams::default().with_scope(scope).with_limit(5));
        push_unique(found, &mut commits);
    }

    if commits.is_empty() && !signals.intent_hints.is_empty() {
        let found = index.query(
            &QueryParams::default()
                .with_intents(signals.intent_hints.clone())
                .with_limit(5),
        );
        push_unique(found, &mut commits);
    }

    for keyword in signals.keywords.iter().take(3) {
        let found = index.query(
            &QueryParams::default()
                .with_decided_against(keyword)
                .with_limit(3),
        );
        push_unique(found, &mut commits);
    }

    commits.truncate(MAX_INJECTED_COMMITS);
    commits
}

fn format_commit_block(commits: &[&IndexedCommit]) -> String {
    let mut out = format!("<commit-memory commits=\"{}\">\n", commits.len());
    for commit in commits {
        out.push_str(&format_commit_line(commit));
    }
    out.push_str("</commit-memory>");
    out
}

fn format_commit_line(commit: &IndexedCommit) -> String {
    let short: String = commit.hash.chars().take(7).collect();
    let mut line = format!("- {short} {}", commit.subject);
    if !commit.scope.is_empty() {
        line.push_str(&format!(" [{}]", commit.scope.join(", ")));
    }
    if let Some(intent) = commit.intent {
        line.push_str(&format!(" ({intent})"));
    }
    line.push('\n');
    for rejected in &commit.decided_against {
        line.push_str(&format!("  decided against: {rejected}\n"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommitType, Intent, StructuredCommit};

    fn commit(hash: &str, scope: &[&str], intent: Intent, rejected: &[&str]) -> StructuredCommit {
        StructuredCommit {
            hash: hash.to_string(),
            date: "2026-02-01T00:00:00+00:00".to_string(),
            commit_type: CommitType::Fix,
            header_scope: None,
            subject: format!("subject {hash}"),
            body: String::new(),
            intent: Some(intent),
            scope: scope.iter().map(ToString::to_string).collect(),
            decided_against: rejected.iter().map(ToString::to_string).collect(),
            session: None,
            refs: Vec::new(),
            context: None,
            breaking: None,
        }
    }

    fn index() -> TrailerIndex {
        let mut index = TrailerIndex::empty("head", "now");
        index.insert(&commit("aaaa111", &["auth/login"], Intent::FixDefect, &[]));
        index.insert(&commit(
            "bbbb222",
            &["cache"],
            Intent::FixDefect,
            &["Redis sentinel"],
        ));
        index.insert(&commit("cccc333", &["auth"], Intent::EnableCapability, &[]));
        index
    }

    #[test]
    fn test_gather_by_scope_hint() {
        let index = index();
        let signals = extract_prompt_signals("fix the auth login bug", &index.scope_keys());
        let commits = gather_commits(&index, &signals);
        let hashes: Vec<&str> = commits.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["aaaa111", "cccc333"]);
    }

    #[test]
    fn test_gather_falls_back_to_intents() {
        let index = index();
        let signals = extract_prompt_signals("something is broken somewhere", &index.scope_keys());
        assert!(signals.scope_hints.is_empty());
        let commits = gather_commits(&index, &signals);
        assert!(
            commits
                .iter()
                .all(|c| c.intent == Some(Intent::FixDefect))
        );
        assert!(!commits.is_empty());
    }

    #[test]
    fn test_gather_decided_against_keyword() {
        let index = index();
        let signals = extract_prompt_signals("should we use redis here", &index.scope_keys());
        let commits = gather_commits(&index, &signals);
        assert!(commits.iter().any(|c| c.hash == "bbbb222"));
    }

    #[test]
    fn test_commit_block_format() {
        let index = index();
        let commits = index.query(&QueryParams::default().with_scope("cache"));
        let block = format_commit_block(&commits);
        assert!(block.starts_with("<commit-memory commits=\"1\">"));
        assert!(block.contains("- bbbb222 subject bbbb222 [cache] (fix-defect)"));
        assert!(block.contains("  decided against: Redis sentinel"));
        assert!(block.ends_with("</commit-memory>"));
    }

    #[test]
    fn test_empty_prompt_is_silent() {
        let handler = UserPromptHandler::new();
        let output = handler
            .handle(r#"{"hook_event_name": "UserPromptSubmit", "prompt": "  "}"#)
            .unwrap();
        assert!(output.is_empty());
    }
}
