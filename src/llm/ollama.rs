//! Ollama (local) chat client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmClient};
use crate::config::RlmSettings;
use crate::{Error, Result};

/// Client for a local Ollama `/api/chat` endpoint.
pub struct OllamaClient {
    endpoint: String,
    model: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    /// Builds a client from RLM settings.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn from_settings(settings: &RlmSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| Error::OperationFailed {
                operation: "build_http_client".to_string(),
                cause: e.to_string(),
            })?;
        Ok(Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            client,
        })
    }

    /// Overrides the completion token cap (the REPL uses a larger one).
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request(&self, messages: &[ChatMessage]) -> Result<String> {
        tracing::info!(provider = "ollama", model = %self.model, "making LLM request");

        let request = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream: false,
            options: ChatOptions {
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&request)
            .send()
            .map_err(|e| {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connect"
                } else {
                    "request"
                };
                tracing::error!(
                    provider = "ollama",
                    model = %self.model,
                    error = %e,
                    error_kind,
                    "LLM request failed"
                );
                Error::OperationFailed {
                    operation: "ollama_request".to_string(),
                    cause: format!("{error_kind} error: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            tracing::error!(
                provider = "ollama",
                model = %self.model,
                status = %status,
                "LLM API returned error status"
            );
            return Err(Error::OperationFailed {
                operation: "ollama_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let response: ChatResponse = response.json().map_err(|e| {
            tracing::error!(provider = "ollama", error = %e, "failed to parse LLM response");
            Error::OperationFailed {
                operation: "ollama_response".to_string(),
                cause: e.to_string(),
            }
        })?;

        Ok(response.message.content)
    }
}

impl LlmClient for OllamaClient {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.request(messages)
    }
}

/// Request to the chat API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    num_predict: u32,
}

/// Response from the chat API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_normalizes_endpoint() {
        let settings = RlmSettings {
            endpoint: "http://localhost:11434/".to_string(),
            ..RlmSettings::default()
        };
        let client = OllamaClient::from_settings(&settings).unwrap();
        assert_eq!(client.endpoint, "http://localhost:11434");
        assert_eq!(client.name(), "ollama");
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = ChatRequest {
            model: "qwen2.5-coder".to_string(),
            messages: vec![ChatMessage::user("hi")],
            stream: false,
            options: ChatOptions { num_predict: 256 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 256);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
