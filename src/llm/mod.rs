//! LLM client abstraction.
//!
//! A small synchronous chat interface; the concrete client talks to a
//! local Ollama endpoint and tests inject scripted fakes.

mod ollama;

pub use ollama::OllamaClient;

use serde::{Deserialize, Serialize};

use crate::Result;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for LLM chat providers.
pub trait LlmClient: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for a conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    fn chat(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("s").role, "system");
        assert_eq!(ChatMessage::user("u").role, "user");
        assert_eq!(ChatMessage::assistant("a").role, "assistant");
        assert_eq!(ChatMessage::user("hello").content, "hello");
    }
}
