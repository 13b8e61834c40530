//! System prompt for the RLM REPL.
//!
//! The prompt describes API shapes and budgets plus a capped scope-key
//! sample. It never embeds index contents: commit hashes reach the model
//! only through code it writes and runs itself.

use crate::models::Intent;
use crate::repl::ReplConfig;
use crate::sandbox::SandboxEnv;

/// Cap on the scope-key sample embedded in the prompt.
pub const SCOPE_KEY_SAMPLE: usize = 20;

/// Builds the REPL system prompt for an environment and budget set.
#[must_use]
pub fn build_system_prompt(env: &SandboxEnv, config: &ReplConfig) -> String {
    let intents: Vec<&str> = Intent::ALL.iter().map(|i| i.as_str()).collect();
    let sample: Vec<&str> = env
        .scope_keys
        .iter()
        .take(SCOPE_KEY_SAMPLE)
        .map(String::as_str)
        .collect();
    let memory_state = if env.working_memory.is_some() {
        "present"
    } else {
        "absent"
    };

    format!(
        "You explore a git commit-history index by writing JavaScript. Each \
         fragment you write runs in a sandbox exposing exactly this API:\n\
         \n\
         - query({{scope?, intents?, session?, decidedAgainst?, limit?}}) -> \
         [{{hash, date, subject, intent, scope, session, decidedAgainst}}]\n\
         - callLlm(messages) -> Promise<string>  // messages: [{{role, content}}]\n\
         - gitLog(args) -> Promise<string>  // `git log` with flags limited to \
         --format, --author, --since, --until, --grep, --no-merges, -n (capped at 50)\n\
         - done(answer)  // call once you have the answer\n\
         - console.log(...)  // output comes back to you next turn\n\
         - index, workingMemory, scopeKeys  // read-only data\n\
         \n\
         Intents: {intents}.\n\
         Scope keys (sample): {sample}.\n\
         Commits indexed: {commits}. Working memory: {memory_state}.\n\
         Budgets: {iterations} iterations, {llm_calls} LLM calls, {budget_ms} ms total; \
         each execution is capped at 2 seconds.\n\
         \n\
         Reply with exactly one fenced ```js code block per turn. Globals \
         persist between turns. When you already know the final answer, reply \
         with plain text and no code block.",
        intents = intents.join(", "),
        sample = sample.join(", "),
        commits = env.index.commit_count,
        iterations = config.max_iterations,
        llm_calls = config.max_llm_calls,
        budget_ms = config.timeout_budget_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TrailerIndex;

    fn env_with_keys(n: usize) -> SandboxEnv {
        let mut index = TrailerIndex::empty("0000deadbeef", "now");
        for i in 0..n {
            index
                .by_scope
                .insert(format!("domain{i}/module"), vec![format!("hash{i}")]);
        }
        SandboxEnv::new(index, None)
    }

    #[test]
    fn test_prompt_names_the_full_api() {
        let prompt = build_system_prompt(&env_with_keys(3), &ReplConfig::default());
        for name in [
            "query(",
            "callLlm(",
            "gitLog(",
            "done(",
            "console.log",
            "workingMemory",
            "scopeKeys",
        ] {
            assert!(prompt.contains(name), "missing {name}");
        }
        assert!(prompt.contains("fix-defect"));
        assert!(prompt.contains("resolve-blocker"));
    }

    #[test]
    fn test_scope_key_sample_is_capped() {
        let prompt = build_system_prompt(&env_with_keys(40), &ReplConfig::default());
        assert!(prompt.contains("domain19/module"));
        assert!(!prompt.contains("domain20/module"));
    }

    #[test]
    fn test_prompt_never_embeds_commit_hashes() {
        let prompt = build_system_prompt(&env_with_keys(5), &ReplConfig::default());
        assert!(!prompt.contains("hash0"));
        assert!(!prompt.contains("0000deadbeef"));
    }

    #[test]
    fn test_prompt_carries_budget_numbers() {
        let config = ReplConfig {
            max_iterations: 4,
            max_llm_calls: 9,
            timeout_budget_ms: 12_000,
            max_output_tokens: 512,
        };
        let prompt = build_system_prompt(&env_with_keys(1), &config);
        assert!(prompt.contains("4 iterations"));
        assert!(prompt.contains("9 LLM calls"));
        assert!(prompt.contains("12000 ms"));
    }
}
