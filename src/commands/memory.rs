//! `memory` command: session working-memory writes and reads.

use std::process::ExitCode;

use clap::Subcommand;

use gitrecall::models::EntryTag;
use gitrecall::{Error, GitRepo, Result, WorkingMemoryStore};

use super::default_session_id;

/// Working-memory subcommands.
#[derive(Subcommand)]
pub enum MemoryAction {
    /// Append a tagged entry.
    Add {
        /// The entry text.
        text: String,

        /// Entry tag: finding, hypothesis, decision, context, or todo.
        #[arg(short, long, default_value = "finding")]
        tag: String,

        /// Scope labels (comma-separated).
        #[arg(short, long)]
        scope: Option<String>,

        /// Where the entry came from.
        #[arg(long)]
        source: Option<String>,

        /// Session id (default: today's default session).
        #[arg(long)]
        session: Option<String>,
    },

    /// Show the current session's entries.
    Show {
        /// Session id (default: today's default session).
        #[arg(long)]
        session: Option<String>,

        /// Show only the last N entries.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Remove the working-memory file.
    Clear {
        /// Session id (default: today's default session).
        #[arg(long)]
        session: Option<String>,
    },
}

/// Dispatches a memory subcommand.
pub fn cmd_memory(action: MemoryAction) -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    match action {
        MemoryAction::Add {
            text,
            tag,
            scope,
            source,
            session,
        } => {
            let tag = EntryTag::parse(&tag).ok_or_else(|| Error::OperationFailed {
                operation: "parse_tag".to_string(),
                cause: format!("unknown tag '{tag}'"),
            })?;
            let scope: Vec<String> = scope
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            let store = store(&repo, session);
            let memory = store.add_entry(tag, scope, text, source)?;
            println!(
                "Recorded entry {} for session {}",
                memory.entries.len(),
                memory.session_id
            );
        },
        MemoryAction::Show { session, limit } => {
            let store = store(&repo, session);
            match store.load()? {
                Some(memory) => {
                    println!("{}", WorkingMemoryStore::format_block(&memory, limit));
                },
                None => println!("(no working memory for session {})", store.session_id()),
            }
        },
        MemoryAction::Clear { session } => {
            let store = store(&repo, session);
            store.clear()?;
            println!("Cleared working memory for session {}", store.session_id());
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn store(repo: &GitRepo, session: Option<String>) -> WorkingMemoryStore {
    WorkingMemoryStore::new(repo, session.unwrap_or_else(default_session_id))
}
