//! `status` command.

use std::process::ExitCode;

use gitrecall::{GitRepo, Result, RlmSettings, TrailerIndex, WorkingMemoryStore};

use super::default_session_id;

/// Reports index freshness, working-memory state, and RLM configuration.
pub fn cmd_status() -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    println!("Repository: {}", repo.git_dir().display());

    let path = TrailerIndex::path_for(&repo);
    match TrailerIndex::load_file(&path)? {
        None => println!("Index:      absent (run `gitrecall index`)"),
        Some(index) => {
            let head = repo.head()?;
            let freshness = if index.head_commit == head {
                "fresh"
            } else {
                "stale (run `gitrecall index`)"
            };
            println!(
                "Index:      {} commits, {} scopes, built {} — {freshness}",
                index.commit_count,
                index.by_scope.len(),
                index.generated
            );
        },
    }

    let store = WorkingMemoryStore::new(&repo, default_session_id());
    match store.load()? {
        Some(memory) => println!(
            "Memory:     {} entries for session {}",
            memory.entries.len(),
            memory.session_id
        ),
        None => println!("Memory:     (empty for session {})", store.session_id()),
    }

    let settings = RlmSettings::load(&repo)?;
    println!(
        "RLM:        {} (repl {}), {} @ {}",
        if settings.enabled { "enabled" } else { "disabled" },
        if settings.repl_enabled { "on" } else { "off" },
        settings.model,
        settings.endpoint
    );
    Ok(ExitCode::SUCCESS)
}
