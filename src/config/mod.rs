//! RLM configuration.
//!
//! Loaded from `<git-dir>/info/rlm-config.json`. A missing file yields the
//! defaults (disabled, local Ollama endpoint, conservative budgets); a
//! present file only needs the fields it wants to change. Environment
//! overrides apply last.

use serde::{Deserialize, Serialize};

use crate::git::GitRepo;
use crate::repl::ReplConfig;
use crate::{Error, Result};

/// Config file name under `<git-dir>/info/`.
pub const RLM_CONFIG_FILE: &str = "rlm-config.json";

/// Current config schema version.
pub const RLM_CONFIG_VERSION: u32 = 1;

const fn default_version() -> u32 {
    RLM_CONFIG_VERSION
}
const fn default_enabled() -> bool {
    false
}
fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "qwen2.5-coder".to_string()
}
const fn default_timeout_ms() -> u64 {
    5_000
}
const fn default_max_tokens() -> u32 {
    256
}
const fn default_repl_enabled() -> bool {
    false
}
const fn default_repl_max_iterations() -> usize {
    6
}
const fn default_repl_max_llm_calls() -> usize {
    10
}
const fn default_repl_timeout_budget_ms() -> u64 {
    15_000
}
const fn default_repl_max_output_tokens() -> u32 {
    512
}

/// Settings for the RLM loop and its LLM endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RlmSettings {
    /// Schema version.
    pub version: u32,
    /// Whether RLM context injection is enabled at all.
    pub enabled: bool,
    /// LLM endpoint base URL.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Per-request HTTP timeout in milliseconds.
    pub timeout_ms: u64,
    /// Max tokens per completion.
    pub max_tokens: u32,
    /// Whether the multi-turn REPL is enabled (vs. single-shot use).
    pub repl_enabled: bool,
    /// REPL iteration cap.
    pub repl_max_iterations: usize,
    /// REPL LLM call budget.
    pub repl_max_llm_calls: usize,
    /// REPL wall-clock budget in milliseconds.
    pub repl_timeout_budget_ms: u64,
    /// Max tokens for REPL completions.
    pub repl_max_output_tokens: u32,
}

impl Default for RlmSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            repl_enabled: default_repl_enabled(),
            repl_max_iterations: default_repl_max_iterations(),
            repl_max_llm_calls: default_repl_max_llm_calls(),
            repl_timeout_budget_ms: default_repl_timeout_budget_ms(),
            repl_max_output_tokens: default_repl_max_output_tokens(),
        }
    }
}

impl RlmSettings {
    /// Loads settings for a repository, applying env overrides.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or unparseable config file; a missing file is
    /// the defaults.
    pub fn load(repo: &GitRepo) -> Result<Self> {
        let path = repo.info_dir().join(RLM_CONFIG_FILE);
        let settings = match std::fs::read_to_string(&path) {
            Ok(json) => {
                serde_json::from_str::<Self>(&json).map_err(|e| Error::OperationFailed {
                    operation: "parse_rlm_config".to_string(),
                    cause: e.to_string(),
                })?
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(Error::IoFailed {
                    path: path.display().to_string(),
                    cause: e.to_string(),
                });
            },
        };
        Ok(settings.with_env_overrides())
    }

    /// Applies `GITRECALL_RLM_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("GITRECALL_RLM_ENABLED") {
            self.enabled = v.to_lowercase() == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("GITRECALL_RLM_REPL_ENABLED") {
            self.repl_enabled = v.to_lowercase() == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("GITRECALL_RLM_ENDPOINT")
            && !v.trim().is_empty()
        {
            self.endpoint = v;
        }
        if let Ok(v) = std::env::var("GITRECALL_RLM_MODEL")
            && !v.trim().is_empty()
        {
            self.model = v;
        }
        self
    }

    /// The REPL budgets carried by these settings.
    #[must_use]
    pub const fn repl_config(&self) -> ReplConfig {
        ReplConfig {
            max_iterations: self.repl_max_iterations,
            max_llm_calls: self.repl_max_llm_calls,
            timeout_budget_ms: self.repl_timeout_budget_ms,
            max_output_tokens: self.repl_max_output_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = RlmSettings::default();
        assert!(!settings.enabled);
        assert_eq!(settings.endpoint, "http://localhost:11434");
        assert_eq!(settings.timeout_ms, 5_000);
        assert_eq!(settings.max_tokens, 256);
        assert!(!settings.repl_enabled);
        assert_eq!(settings.repl_max_iterations, 6);
        assert_eq!(settings.repl_max_llm_calls, 10);
        assert_eq!(settings.repl_timeout_budget_ms, 15_000);
        assert_eq!(settings.repl_max_output_tokens, 512);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: RlmSettings =
            serde_json::from_str(r#"{"enabled": true, "replMaxIterations": 3}"#).unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.repl_max_iterations, 3);
        assert_eq!(settings.endpoint, "http://localhost:11434");
        assert_eq!(settings.version, RLM_CONFIG_VERSION);
    }

    #[test]
    fn test_serde_camel_case() {
        let json = serde_json::to_value(RlmSettings::default()).unwrap();
        assert!(json.get("replTimeoutBudgetMs").is_some());
        assert!(json.get("timeoutMs").is_some());
        assert!(json.get("repl_timeout_budget_ms").is_none());
    }

    #[test]
    fn test_repl_config_projection() {
        let settings = RlmSettings {
            repl_max_iterations: 4,
            repl_max_llm_calls: 7,
            ..RlmSettings::default()
        };
        let config = settings.repl_config();
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.max_llm_calls, 7);
        assert_eq!(config.timeout_budget_ms, 15_000);
    }
}
