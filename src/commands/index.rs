//! `index` command: rebuild the trailer index.

use std::process::ExitCode;

use gitrecall::{GitRepo, Result, TrailerIndex};

/// Rebuilds and persists the trailer index for the current repository.
pub fn cmd_index() -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let index = TrailerIndex::build(&repo)?;
    index.save(&repo)?;
    println!(
        "Indexed {} commits ({} scopes, {} sessions) at {}",
        index.commit_count,
        index.by_scope.len(),
        index.by_session.len(),
        TrailerIndex::path_for(&repo).display()
    );
    Ok(ExitCode::SUCCESS)
}
