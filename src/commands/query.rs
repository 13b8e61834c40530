//! `query` command: operator-facing index queries.

use std::process::ExitCode;

use gitrecall::models::Intent;
use gitrecall::{Error, GitRepo, QueryParams, Result, TrailerIndex};

/// Runs one index query and prints one line per commit.
pub fn cmd_query(
    scope: Option<String>,
    intents: Vec<String>,
    session: Option<String>,
    decided_against: Option<String>,
    limit: usize,
) -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let index = TrailerIndex::load_fresh(&repo)?.ok_or_else(|| Error::OperationFailed {
        operation: "load_index".to_string(),
        cause: "no fresh index; run `gitrecall index` first".to_string(),
    })?;

    let mut params = QueryParams {
        scope,
        session,
        decided_against,
        limit: Some(limit),
        ..QueryParams::default()
    };
    if !intents.is_empty() {
        let parsed: Option<Vec<Intent>> = intents.iter().map(|s| Intent::parse(s)).collect();
        let parsed = parsed.ok_or_else(|| Error::OperationFailed {
            operation: "parse_intent".to_string(),
            cause: format!(
                "unknown intent; expected one of: {}",
                Intent::ALL.map(|i| i.as_str()).join(", ")
            ),
        })?;
        params.intents = Some(parsed);
    }

    if params.is_unconstrained() {
        return Err(Error::OperationFailed {
            operation: "query".to_string(),
            cause: "at least one filter is required".to_string(),
        });
    }

    let commits = index.query(&params);
    for commit in &commits {
        let short: String = commit.hash.chars().take(7).collect();
        let intent = commit
            .intent
            .map(|i| format!(" ({i})"))
            .unwrap_or_default();
        println!(
            "{short} {date} {subject} [{scope}]{intent}",
            date = &commit.date[..commit.date.len().min(10)],
            subject = commit.subject,
            scope = commit.scope.join(", "),
        );
        for rejected in &commit.decided_against {
            println!("        decided against: {rejected}");
        }
    }
    if commits.is_empty() {
        println!("(no matching commits)");
    }
    Ok(ExitCode::SUCCESS)
}
