//! Binary entry point for gitrecall.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in the CLI binary
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gitrecall::observability;

use commands::{HookEvent, MemoryAction};

/// gitrecall - commit-history memory for AI coding agents.
#[derive(Parser)]
#[command(name = "gitrecall")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Rebuild the trailer index from git history.
    Index,

    /// Validate a commit message (stdin, --file, or a revision).
    Validate {
        /// Read the message from a file instead of stdin.
        #[arg(short, long)]
        file: Option<String>,

        /// Validate the message of a revision (e.g. HEAD).
        #[arg(short, long)]
        rev: Option<String>,
    },

    /// Query the trailer index.
    Query {
        /// Hierarchical scope pattern (e.g. auth or auth/login).
        #[arg(short, long)]
        scope: Option<String>,

        /// Intent filter (repeatable).
        #[arg(short, long)]
        intent: Vec<String>,

        /// Session id filter.
        #[arg(long)]
        session: Option<String>,

        /// Keyword against decided-against entries.
        #[arg(short, long)]
        decided_against: Option<String>,

        /// Maximum results.
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Manage session working memory.
    Memory {
        /// Memory subcommand.
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Consolidate a session's working memory into a summary.
    Consolidate {
        /// Session id (default: today's default session).
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Ask the RLM loop a question about the commit history.
    Ask {
        /// The question.
        prompt: String,

        /// Print the iteration trace.
        #[arg(long)]
        trace: bool,
    },

    /// Show index, memory, and RLM status.
    Status,

    /// Handle agent lifecycle hooks (reads a JSON envelope on stdin).
    Hook {
        /// Hook event type.
        #[command(subcommand)]
        event: HookEvent,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    observability::init(cli.verbose);

    let result = match cli.command {
        Commands::Index => commands::cmd_index(),
        Commands::Validate { file, rev } => commands::cmd_validate(file, rev),
        Commands::Query {
            scope,
            intent,
            session,
            decided_against,
            limit,
        } => commands::cmd_query(scope, intent, session, decided_against, limit),
        Commands::Memory { action } => commands::cmd_memory(action),
        Commands::Consolidate { session } => commands::cmd_consolidate(session),
        Commands::Ask { prompt, trace } => commands::cmd_ask(prompt, trace),
        Commands::Status => commands::cmd_status(),
        Commands::Hook { event } => return commands::cmd_hook(event),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error [{}]: {e}", e.tag());
            ExitCode::FAILURE
        },
    }
}
