//! `hook` command: agent lifecycle entry points.
//!
//! Hooks read one JSON envelope from stdin and print context to stdout.
//! They always exit 0: a failing hook must never interfere with the agent,
//! so errors are logged and swallowed.

use std::io::Read;
use std::process::ExitCode;

use clap::Subcommand;

use gitrecall::hooks::{HookHandler, PostToolUseHandler, StopHandler, UserPromptHandler};

/// Hook event types.
#[derive(Subcommand, Clone, Copy)]
pub enum HookEvent {
    /// The user submitted a prompt.
    UserPromptSubmit,
    /// The agent finished running a tool.
    PostToolUse,
    /// The session ended.
    Stop,
}

impl HookEvent {
    const fn as_str(self) -> &'static str {
        match self {
            Self::UserPromptSubmit => "user-prompt-submit",
            Self::PostToolUse => "post-tool-use",
            Self::Stop => "stop",
        }
    }
}

/// Dispatches a hook event. Always exits 0.
pub fn cmd_hook(event: HookEvent) -> ExitCode {
    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        input.clear();
    }

    let result = match event {
        HookEvent::UserPromptSubmit => UserPromptHandler::new().handle(&input),
        HookEvent::PostToolUse => PostToolUseHandler::new().handle(&input),
        HookEvent::Stop => StopHandler::new().handle(&input),
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        },
        Err(e) => {
            // silent on the hook path by design
            tracing::debug!(hook = event.as_str(), error = %e, "hook failed");
        },
    }
    ExitCode::SUCCESS
}
