//! Git subprocess plumbing.
//!
//! git is treated as a subprocess that returns text. Nothing here links a
//! git library; every call is a fresh `git` child process with captured
//! stdout, which keeps the process model identical to the hooks' own
//! short-lived invocations.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Error, Result};

/// The record format handed to `git log` for batch ingestion.
///
/// Each commit renders as an unambiguous block:
/// `---commit---\nHash: <h>\nDate: <iso>\nSubject: <header>\n<body-and-trailers>`.
pub const COMMIT_LOG_FORMAT: &str = "---commit---%nHash: %H%nDate: %aI%nSubject: %s%n%b";

/// Separator line between commit records.
pub const COMMIT_SEPARATOR: &str = "---commit---";

/// Handle to a git repository, anchored at a working directory.
#[derive(Debug, Clone)]
pub struct GitRepo {
    work_dir: PathBuf,
    git_dir: PathBuf,
}

impl GitRepo {
    /// Opens the repository containing `dir`.
    ///
    /// # Errors
    ///
    /// Fails when `dir` is not inside a git repository or git is missing.
    pub fn at(dir: impl AsRef<Path>) -> Result<Self> {
        let work_dir = dir.as_ref().to_path_buf();
        let out = run_git(&work_dir, &["rev-parse", "--git-dir"])?;
        let raw = PathBuf::from(out.trim());
        let git_dir = if raw.is_absolute() {
            raw
        } else {
            work_dir.join(raw)
        };
        Ok(Self { work_dir, git_dir })
    }

    /// Opens the repository containing the current directory.
    ///
    /// # Errors
    ///
    /// Fails when the current directory is unavailable or not a repository.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| Error::OperationFailed {
            operation: "current_dir".to_string(),
            cause: e.to_string(),
        })?;
        Self::at(cwd)
    }

    /// The repository's metadata directory (`.git` or the worktree git dir).
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The `<git-dir>/info` directory where gitrecall keeps its files.
    #[must_use]
    pub fn info_dir(&self) -> PathBuf {
        self.git_dir.join("info")
    }

    /// Resolves the current HEAD commit hash.
    ///
    /// # Errors
    ///
    /// Fails on a repository without commits.
    pub fn head(&self) -> Result<String> {
        run_git(&self.work_dir, &["rev-parse", "HEAD"]).map(|out| out.trim().to_string())
    }

    /// Runs the batch-ingestion `git log` with the fixed record format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitLogFailed`] when the subprocess fails.
    pub fn log_records(&self, limit: Option<usize>) -> Result<String> {
        let format_arg = format!("--format={COMMIT_LOG_FORMAT}");
        let mut args = vec!["log"];
        let n;
        if let Some(limit) = limit {
            n = format!("-{limit}");
            args.push(&n);
        }
        args.push(&format_arg);
        run_git(&self.work_dir, &args)
    }

    /// Live `git log --grep` fallback used when the index is stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitLogFailed`] when the subprocess fails.
    pub fn log_grep(&self, patterns: &[String], limit: usize) -> Result<String> {
        let format_arg = format!("--format={COMMIT_LOG_FORMAT}");
        let n = format!("-{limit}");
        let mut args = vec!["log".to_string(), n, format_arg];
        for pattern in patterns {
            args.push(format!("--grep={pattern}"));
        }
        args.push("--all-match".to_string());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_git(&self.work_dir, &args)
    }

    /// Runs `git log` with caller-supplied, already-sanitized arguments.
    ///
    /// The sandbox's `gitLog` effect lands here after passing
    /// [`crate::sandbox::sanitize_git_log_args`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitLogFailed`] when the subprocess fails.
    pub fn log_with_args(&self, args: &[String]) -> Result<String> {
        let mut full = vec!["log"];
        full.extend(args.iter().map(String::as_str));
        run_git(&self.work_dir, &full)
    }

    /// Reads the full message of a single commit (`HEAD` by default).
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitLogFailed`] when the subprocess fails.
    pub fn commit_message(&self, rev: &str) -> Result<String> {
        run_git(&self.work_dir, &["log", "-1", "--format=%B", rev])
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| {
            tracing::error!(error = %e, "failed to spawn git");
            Error::GitLogFailed(format!("failed to spawn git: {e}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(
            args = ?args,
            status = %output.status,
            stderr = %stderr.trim(),
            "git subprocess failed"
        );
        return Err(Error::GitLogFailed(format!(
            "git {} exited with {}: {}",
            args.first().unwrap_or(&""),
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| Error::GitLogFailed(format!("undecodable git output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_repo() -> (tempfile::TempDir, GitRepo) {
        let dir = tempfile::tempdir().expect("tempdir");
        let run = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .status()
                .expect("git runs");
            assert!(status.success(), "git {args:?}");
        };
        run(&["init", "-q"]);
        run(&["config", "user.email", "dev@example.com"]);
        run(&["config", "user.name", "Dev"]);
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        run(&["add", "."]);
        run(&[
            "commit",
            "-q",
            "-m",
            "feat(auth): add login\n\nAdds the login flow.\n\nIntent: enable-capability\nScope: auth/login",
        ]);
        let repo = GitRepo::at(dir.path()).expect("repo opens");
        (dir, repo)
    }

    #[test]
    fn test_at_rejects_non_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(GitRepo::at(dir.path()).is_err());
    }

    #[test]
    fn test_head_and_log_records() {
        let (_dir, repo) = scratch_repo();
        let head = repo.head().unwrap();
        assert_eq!(head.len(), 40);

        let records = repo.log_records(None).unwrap();
        assert!(records.starts_with(COMMIT_SEPARATOR));
        assert!(records.contains(&format!("Hash: {head}")));
        assert!(records.contains("Subject: feat(auth): add login"));
        assert!(records.contains("Intent: enable-capability"));
    }

    #[test]
    fn test_info_dir_is_under_git_dir() {
        let (_dir, repo) = scratch_repo();
        assert!(repo.info_dir().ends_with("info"));
        assert!(repo.info_dir().starts_with(repo.git_dir()));
    }

    #[test]
    fn test_commit_message_roundtrip() {
        let (_dir, repo) = scratch_repo();
        let message = repo.commit_message("HEAD").unwrap();
        assert!(message.starts_with("feat(auth): add login"));
        assert!(message.contains("Scope: auth/login"));
    }
}
