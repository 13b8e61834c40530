//! `consolidate` command: manual session consolidation.

use std::process::ExitCode;

use gitrecall::memory::consolidation::{
    decisions_to_trailers, format_session_summary, format_trailer_hints, summary_file_name,
};
use gitrecall::{Error, GitRepo, Result, WorkingMemoryStore};

use super::default_session_id;

/// Consolidates a session: writes the summary file, prints the trailer
/// suggestions, and clears working memory.
pub fn cmd_consolidate(session: Option<String>) -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let session_id = session.unwrap_or_else(default_session_id);
    let store = WorkingMemoryStore::new(&repo, &session_id);

    let Some(memory) = store.load()? else {
        return Err(Error::OperationFailed {
            operation: "consolidate".to_string(),
            cause: format!("no working memory for session {session_id}"),
        });
    };

    let summary = format_session_summary(&memory);
    let path = repo.info_dir().join(summary_file_name(&session_id));
    gitrecall::index::atomic_write(&path, &summary)?;

    let suggestions = decisions_to_trailers(&memory.entries);
    store.clear()?;

    println!("Session summary written to {}", path.display());
    if !suggestions.is_empty() {
        println!("\nSuggested commit trailers:");
        print!("{}", format_trailer_hints(&suggestions));
    }
    Ok(ExitCode::SUCCESS)
}
