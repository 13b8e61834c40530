//! `ask` command: run the RLM loop from the CLI.

use std::process::ExitCode;
use std::sync::Arc;

use gitrecall::llm::OllamaClient;
use gitrecall::repl::run_repl;
use gitrecall::sandbox::SandboxEnv;
use gitrecall::{Error, GitRepo, LlmClient, Result, RlmSettings, TrailerIndex, WorkingMemoryStore};

use super::default_session_id;

/// Asks the RLM loop one question about the commit history and prints the
/// answer. `--trace` additionally prints the iteration trace to stderr.
pub fn cmd_ask(prompt: String, trace: bool) -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let index = TrailerIndex::load_fresh(&repo)?.ok_or_else(|| Error::OperationFailed {
        operation: "load_index".to_string(),
        cause: "no fresh index; run `gitrecall index` first".to_string(),
    })?;

    let settings = RlmSettings::load(&repo)?;
    let memory = WorkingMemoryStore::new(&repo, default_session_id())
        .load()
        .ok()
        .flatten();

    let client =
        OllamaClient::from_settings(&settings)?.with_max_tokens(settings.repl_max_output_tokens);
    let llm: Arc<dyn LlmClient> = Arc::new(client);
    let env = SandboxEnv::new(index, memory);
    let git_repo = repo.clone();

    let outcome = run_repl(
        &llm,
        env,
        &prompt,
        &settings.repl_config(),
        Box::new(move |args| git_repo.log_with_args(args)),
    )?;

    if trace {
        for entry in &outcome.trace {
            eprintln!("--- iteration {} ({} sub-calls)", entry.iteration, entry.sub_calls);
            eprintln!("{}", entry.code);
            eprintln!(">>> {}", entry.result.trim_end());
        }
        eprintln!(
            "--- {} iterations, {} LLM calls",
            outcome.iterations, outcome.llm_calls
        );
    }

    println!("{}", outcome.answer);
    Ok(ExitCode::SUCCESS)
}
