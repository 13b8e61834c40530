//! Session-stop hook.
//!
//! Consolidates the session's working memory: writes the Markdown summary
//! under `<git-dir>/info/`, surfaces the suggested commit trailers, and
//! clears the working-memory file.

use super::{HookEnvelope, HookHandler, derive_session_id};
use crate::Result;
use crate::git::GitRepo;
use crate::index::atomic_write;
use crate::memory::WorkingMemoryStore;
use crate::memory::consolidation::{
    decisions_to_trailers, format_session_summary, format_trailer_hints, summary_file_name,
};

/// Handles `Stop` events.
#[derive(Debug, Default)]
pub struct StopHandler {
    repo: Option<GitRepo>,
}

impl StopHandler {
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

impl HookHandler for StopHandler {
    fn event_type(&self) -> &'static str {
        "Stop"
    }

    fn handle(&self, input: &str) -> Result<String> {
        let envelope = HookEnvelope::parse(input);
        let Some(repo) = self.repo() else {
            return Ok(String::new());
        };

        let session_id = derive_session_id(&envelope);
        let store = WorkingMemoryStore::new(&repo, &session_id);
        let Some(memory) = store.load()? else {
            return Ok(String::new());
        };
        if memory.entries.is_empty() {
            store.clear()?;
            return Ok(String::new());
        }

        let summary = format_session_summary(&memory);
        let path = repo.info_dir().join(summary_file_name(&session_id));
        atomic_write(&path, &summary)?;
        tracing::info!(
            session = %session_id,
            entries = memory.entries.len(),
            path = %path.display(),
            "session consolidated"
        );

        let suggestions = decisions_to_trailers(&memory.entries);
        store.clear()?;

        let mut out = format!(
            "<session-consolidation session=\"{session_id}\">\n\
             Session summary written to {}\n",
            path.display()
        );
        if !suggestions.is_empty() {
            out.push_str("\nSuggested commit trailers (candidates, curate before committing):\n");
            out.push_str(&format_trailer_hints(&suggestions));
        }
        out.push_str("</session-consolidation>");
        Ok(out)
    }
}
