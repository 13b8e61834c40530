//! REPL-over-sandbox integration, including the sanitized git effect
//! against a real repository.

// Integration tests use expect/unwrap for simplicity
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};

use gitrecall::llm::{ChatMessage, LlmClient};
use gitrecall::repl::{ReplConfig, run_repl};
use gitrecall::sandbox::SandboxEnv;
use gitrecall::{GitRepo, Result, TrailerIndex};

struct ScriptedLlm {
    responses: Mutex<Vec<String>>,
    fallback: String,
}

impl ScriptedLlm {
    fn new(responses: &[&str], fallback: &str) -> Arc<dyn LlmClient> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().rev().map(ToString::to_string).collect()),
            fallback: fallback.to_string(),
        })
    }
}

impl LlmClient for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git runs");
    assert!(status.success(), "git {args:?} failed");
}

fn scratch_repo() -> (tempfile::TempDir, GitRepo) {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["config", "user.email", "dev@example.com"]);
    git(dir.path(), &["config", "user.name", "Dev"]);
    for (file, message) in [
        (
            "a.txt",
            "fix(auth): correct login retry backoff\n\nBody.\n\nIntent: fix-defect\nScope: auth/login",
        ),
        (
            "b.txt",
            "feat(auth): add oauth device flow\n\nBody.\n\nIntent: enable-capability\nScope: auth",
        ),
    ] {
        std::fs::write(dir.path().join(file), message).unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-q", "-m", message]);
    }
    let repo = GitRepo::at(dir.path()).unwrap();
    (dir, repo)
}

#[test]
fn test_repl_queries_real_index_and_answers() {
    let (_dir, repo) = scratch_repo();
    let index = TrailerIndex::build(&repo).unwrap();
    let env = SandboxEnv::new(index, None);

    let llm = ScriptedLlm::new(
        &["```js\nconst commits = query({scope: 'auth'});\ndone('Found ' + commits.length + ' auth commits');\n```"],
        "unused",
    );
    let git_repo = repo.clone();
    let outcome = run_repl(
        &llm,
        env,
        "what changed in auth?",
        &ReplConfig::default(),
        Box::new(move |args| git_repo.log_with_args(args)),
    )
    .unwrap();

    assert_eq!(outcome.answer, "Found 2 auth commits");
    assert_eq!(outcome.iterations, 1);
}

#[test]
fn test_repl_git_log_effect_is_sanitized_end_to_end() {
    let (_dir, repo) = scratch_repo();
    let index = TrailerIndex::build(&repo).unwrap();
    let env = SandboxEnv::new(index, None);

    // -n 500 is capped to 50 before reaching git; --format passes through
    let llm = ScriptedLlm::new(
        &["```js\nconst out = await gitLog(['-n', '500', '--format=%s']);\ndone(out.trim().split('\\n')[0]);\n```"],
        "unused",
    );
    let git_repo = repo.clone();
    let outcome = run_repl(
        &llm,
        env,
        "list subjects",
        &ReplConfig::default(),
        Box::new(move |args| git_repo.log_with_args(args)),
    )
    .unwrap();

    assert_eq!(outcome.answer, "feat(auth): add oauth device flow");
}

#[test]
fn test_repl_rejects_hostile_git_args_but_recovers() {
    let (_dir, repo) = scratch_repo();
    let index = TrailerIndex::build(&repo).unwrap();
    let env = SandboxEnv::new(index, None);

    let llm = ScriptedLlm::new(
        &[
            "```js\nawait gitLog(['--format=%s; rm -rf /']);\ndone('should not get here');\n```",
            "```js\ndone('recovered after rejection');\n```",
        ],
        "unused",
    );
    let called = Arc::new(Mutex::new(0_usize));
    let count = Arc::clone(&called);
    let outcome = run_repl(
        &llm,
        env,
        "dig",
        &ReplConfig::default(),
        Box::new(move |_args| {
            *count.lock().unwrap() += 1;
            Ok(String::new())
        }),
    )
    .unwrap();

    assert_eq!(outcome.answer, "recovered after rejection");
    assert_eq!(
        *called.lock().unwrap(),
        0,
        "the git effect must never see a rejected argument"
    );
    assert!(outcome.trace[0].result.contains("dangerous character"));
}
