//! `validate` command: check a commit message against the format rules.

use std::io::Read;
use std::process::ExitCode;

use gitrecall::trailers::validate_message;
use gitrecall::{Error, GitRepo, Result};

/// Validates a commit message from stdin, a file, or a revision.
///
/// Prints `✓` when clean, otherwise one diagnostic per line, to stderr.
/// Exit code 1 when any error-severity diagnostic is present.
pub fn cmd_validate(file: Option<String>, rev: Option<String>) -> Result<ExitCode> {
    let message = read_message(file, rev)?;
    let diagnostics = validate_message(&message);

    if diagnostics.is_empty() {
        eprintln!("✓");
        return Ok(ExitCode::SUCCESS);
    }

    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
    }
    if diagnostics.iter().any(gitrecall::Diagnostic::is_error) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn read_message(file: Option<String>, rev: Option<String>) -> Result<String> {
    if let Some(rev) = rev {
        let repo = GitRepo::discover()?;
        return repo.commit_message(&rev);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path).map_err(|e| Error::IoFailed {
            path,
            cause: e.to_string(),
        });
    }
    let mut message = String::new();
    std::io::stdin()
        .read_to_string(&mut message)
        .map_err(|e| Error::IoFailed {
            path: "<stdin>".to_string(),
            cause: e.to_string(),
        })?;
    Ok(message)
}
