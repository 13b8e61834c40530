//! The RLM REPL driver.
//!
//! A multi-turn loop between the LLM and the sandbox: the model writes a
//! code fragment, the sandbox runs it, and the output (or the execution
//! error) goes back to the model until it calls `done(answer)` or a budget
//! runs out. Three budgets nest: per-execution wall clock (the sandbox's),
//! the loop's LLM call count, and the loop's total wall clock.
//!
//! The loop degrades instead of failing: once the sandbox is up, an answer
//! string always comes back, even if it is only the last execution's
//! output. LLM transport failures inside the loop are the one thing that
//! propagates.

mod system_prompt;

pub use system_prompt::{SCOPE_KEY_SAMPLE, build_system_prompt};

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crate::llm::{ChatMessage, LlmClient};
use crate::sandbox::{GitLogEffect, LlmEffect, Sandbox, SandboxEnv};
use crate::{Error, Result};

/// Budgets for one REPL run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    /// Maximum code-execution iterations.
    pub max_iterations: usize,
    /// LLM call budget, shared with sandbox `callLlm` sub-calls. The forced
    /// final text turn may exceed it by one.
    pub max_llm_calls: usize,
    /// Total wall-clock budget in milliseconds.
    pub timeout_budget_ms: u64,
    /// Completion token cap for REPL turns.
    pub max_output_tokens: u32,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            max_iterations: 6,
            max_llm_calls: 10,
            timeout_budget_ms: 15_000,
            max_output_tokens: 512,
        }
    }
}

/// One iteration's trace record.
#[derive(Debug, Clone)]
pub struct ReplTraceEntry {
    /// 1-based iteration number.
    pub iteration: usize,
    /// The code the model generated.
    pub code: String,
    /// Execution stdout, or the error message.
    pub result: String,
    /// `callLlm` sub-calls served during the execution.
    pub sub_calls: usize,
}

/// Result of one REPL run.
#[derive(Debug, Clone)]
pub struct ReplOutcome {
    /// The answer string. Never empty of meaning: a `done()` answer, a
    /// plain-text reply, a forced final answer, or the last output.
    pub answer: String,
    /// Code-execution iterations performed.
    pub iterations: usize,
    /// Total LLM calls, sub-calls included.
    pub llm_calls: usize,
    /// Per-iteration trace.
    pub trace: Vec<ReplTraceEntry>,
}

/// Runs the REPL protocol for one prompt.
///
/// The sandbox is created here and terminated on every exit path.
///
/// # Errors
///
/// Fails when the sandbox cannot start or an in-loop LLM call fails.
pub fn run_repl(
    llm: &Arc<dyn LlmClient>,
    env: SandboxEnv,
    prompt: &str,
    config: &ReplConfig,
    git_log: GitLogEffect,
) -> Result<ReplOutcome> {
    let system = build_system_prompt(&env, config);
    let conversation = vec![
        ChatMessage::system(system),
        ChatMessage::user(format!(
            "Task: {prompt}\n\nWrite JavaScript code to find relevant context \
             in the commit history, then call done(answer)."
        )),
    ];

    let calls = Rc::new(Cell::new(0_usize));
    let budget = config.max_llm_calls;
    let sandbox_llm: LlmEffect = {
        let llm = Arc::clone(llm);
        let calls = Rc::clone(&calls);
        Box::new(move |messages: &[ChatMessage]| {
            if calls.get() >= budget {
                return Err(Error::LlmBudgetExhausted);
            }
            calls.set(calls.get() + 1);
            llm.chat(messages)
        })
    };

    let mut sandbox = Sandbox::new(env, sandbox_llm, git_log)?;
    let outcome = drive_loop(llm, &mut sandbox, conversation, &calls, config);
    sandbox.terminate();
    outcome
}

#[allow(clippy::too_many_lines)]
fn drive_loop(
    llm: &Arc<dyn LlmClient>,
    sandbox: &mut Sandbox,
    mut conversation: Vec<ChatMessage>,
    calls: &Rc<Cell<usize>>,
    config: &ReplConfig,
) -> Result<ReplOutcome> {
    let start = Instant::now();
    let elapsed_ms = move || u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut trace: Vec<ReplTraceEntry> = Vec::new();
    let mut iterations = 0_usize;

    for i in 1..=config.max_iterations {
        if elapsed_ms() > config.timeout_budget_ms || calls.get() >= config.max_llm_calls {
            break;
        }

        calls.set(calls.get() + 1);
        let response = llm.chat(&conversation)?;

        let Some(code) = extract_code_block(&response) else {
            // no fenced block: the response is the final answer
            tracing::debug!(iteration = i, "model answered in plain text");
            return Ok(ReplOutcome {
                answer: response,
                iterations: i,
                llm_calls: calls.get(),
                trace,
            });
        };
        conversation.push(ChatMessage::assistant(response));
        iterations = i;

        match sandbox.execute(&code) {
            Ok(mut output) => {
                let result = output
                    .error
                    .clone()
                    .unwrap_or_else(|| output.stdout.clone());
                trace.push(ReplTraceEntry {
                    iteration: i,
                    code,
                    result,
                    sub_calls: output.sub_calls,
                });

                if output.done && output.done_answer.is_some() {
                    let answer = output.done_answer.take().unwrap_or_default();
                    tracing::info!(iteration = i, llm_calls = calls.get(), "repl done");
                    return Ok(ReplOutcome {
                        answer,
                        iterations: i,
                        llm_calls: calls.get(),
                        trace,
                    });
                }

                if let Some(error) = output.error {
                    conversation.push(ChatMessage::user(format!(
                        "Execution error: {error}\n{}\nFix the error or call done() \
                         with your best answer.",
                        output.stdout
                    )));
                } else {
                    let stdout = if output.stdout.trim().is_empty() {
                        "(no output)".to_string()
                    } else {
                        output.stdout
                    };
                    conversation.push(ChatMessage::user(format!(
                        "Output:\n{stdout}\n\nContinue analysis or call done(answer)."
                    )));
                }
            },
            Err(Error::SandboxExecutionTimedOut) => {
                trace.push(ReplTraceEntry {
                    iteration: i,
                    code,
                    result: "sandbox execution timed out".to_string(),
                    sub_calls: 0,
                });
                conversation.push(ChatMessage::user(
                    "Execution error: sandbox execution timed out\nFix the error \
                     or call done() with your best answer."
                        .to_string(),
                ));
            },
            // infrastructure failures (a dead sandbox) do propagate
            Err(e) => return Err(e),
        }
    }

    // Loop exit without done: force a final text answer if the wall clock
    // still allows one more call. The call budget grants it a +1.
    if elapsed_ms() <= config.timeout_budget_ms {
        conversation.push(ChatMessage::user(
            "Iteration budget exhausted. Provide your best answer as plain text \
             (no code block)."
                .to_string(),
        ));
        calls.set(calls.get() + 1);
        if let Ok(answer) = llm.chat(&conversation) {
            return Ok(ReplOutcome {
                answer,
                iterations,
                llm_calls: calls.get(),
                trace,
            });
        }
    }

    // Fully exhausted: degrade to the last execution's output.
    let answer = trace.last().map(|entry| entry.result.clone()).unwrap_or_default();
    Ok(ReplOutcome {
        answer,
        iterations,
        llm_calls: calls.get(),
        trace,
    })
}

/// Extracts the first recognized fenced code block.
///
/// Recognized fences are ```` ```js ````, ```` ```javascript ````, and a
/// bare ```` ``` ````. A missing closing fence treats the remainder as
/// code. `None` means the response carried no runnable code.
#[must_use]
pub fn extract_code_block(text: &str) -> Option<String> {
    let mut search = 0;
    while let Some(found) = text[search..].find("```") {
        let open = search + found;
        let after = &text[open + 3..];
        let (tag, rest) = match after.find('\n') {
            Some(newline) => (after[..newline].trim(), &after[newline + 1..]),
            None => (after.trim(), ""),
        };
        if matches!(tag, "" | "js" | "javascript") {
            let code = rest.find("```").map_or(rest, |close| &rest[..close]);
            return Some(code.trim_end().to_string());
        }
        search = open + 3;
    }
    None
}
