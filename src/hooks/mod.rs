//! Agent lifecycle hooks.
//!
//! Three entry points wire the index, working memory, analyzer, and RLM
//! loop into the host agent: prompt submit, post tool use, and session
//! stop. Each hook is a short-lived process that reads one JSON envelope
//! from stdin and writes plain text (XML-tagged blocks) to stdout.
//!
//! Hooks are silent on failure: a missing repository, a stale index, or an
//! unreachable LLM produce empty output, never a non-zero exit that would
//! interfere with the agent.

mod post_tool_use;
mod stop;
mod user_prompt;

pub use post_tool_use::{PostToolUseHandler, parse_query_command};
pub use stop::StopHandler;
pub use user_prompt::UserPromptHandler;

use serde::Deserialize;

use crate::Result;

/// Trait for hook handlers.
pub trait HookHandler {
    /// The hook event type this handler processes.
    fn event_type(&self) -> &'static str;

    /// Handles the hook event. Empty output means "inject nothing".
    ///
    /// # Errors
    ///
    /// Returns an error only for failures worth logging; the CLI swallows
    /// them on the hook path.
    fn handle(&self, input: &str) -> Result<String>;
}

/// The JSON envelope a hook reads from stdin.
///
/// Unknown fields are ignored and missing fields default, so malformed or
/// truncated envelopes degrade to an empty envelope instead of failing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HookEnvelope {
    /// Event name, e.g. `UserPromptSubmit`.
    pub hook_event_name: String,
    /// The submitted prompt (prompt-submit events).
    pub prompt: String,
    /// Host agent session identifier.
    pub session_id: String,
    /// Tool name (post-tool events).
    pub tool_name: String,
    /// Tool input (post-tool events).
    pub tool_input: ToolInput,
    /// Tool response (post-tool events).
    pub tool_response: ToolResponse,
}

/// The `tool_input` member of the envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolInput {
    /// The shell command that ran.
    pub command: String,
}

/// The `tool_response` member of the envelope.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolResponse {
    /// Captured stdout of the tool.
    pub stdout: String,
}

impl HookEnvelope {
    /// Parses an envelope leniently; anything unparseable is the empty
    /// envelope.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        serde_json::from_str(input).unwrap_or_default()
    }
}

/// Derives the working-memory session id for a hook invocation.
///
/// `YYYY-MM-DD/<short-host-session-id>`, or `YYYY-MM-DD/session` when the
/// host did not send one — which is also the CLI's default, so hook and
/// CLI writes land in the same session file out of the box.
#[must_use]
pub fn derive_session_id(envelope: &HookEnvelope) -> String {
    let date = chrono::Utc::now().format("%Y-%m-%d");
    let slug: String = envelope
        .session_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(8)
        .collect();
    if slug.is_empty() {
        format!("{date}/session")
    } else {
        format!("{date}/{slug}")
    }
}
