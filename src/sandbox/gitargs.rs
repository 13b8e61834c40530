//! `gitLog` argument sanitization.
//!
//! LLM-authored code can request `git log` with arbitrary arguments; only a
//! small allow-list survives, and nothing containing a shell metacharacter
//! gets through at all. The sanitizer is the single gate between the
//! sandbox and the git subprocess.

use crate::{Error, Result};

/// Shell metacharacters rejected anywhere in any argument.
pub const DANGEROUS_CHARS: [char; 6] = ['|', ';', '&', '$', '`', '\\'];

/// `--` flags allowed through (matched on the portion before `=`).
pub const ALLOWED_FLAGS: [&str; 6] = [
    "--format",
    "--author",
    "--since",
    "--until",
    "--grep",
    "--no-merges",
];

/// Cap applied to `-n` counts.
pub const MAX_LOG_COUNT: u64 = 50;

/// Validates and normalizes `git log` arguments from the sandbox.
///
/// Returns the arguments to pass to git, with `-n` counts capped at 50.
///
/// # Errors
///
/// - [`Error::DangerousCharacter`] for any argument containing one of
///   `| ; & $ ` \`.
/// - [`Error::DisallowedFlag`] for flags outside the allow-list.
/// - [`Error::InvalidN`] for a `-n` without a numeric count in `1..=50`
///   before capping (zero is invalid, large counts are clamped).
pub fn sanitize_git_log_args(args: &[String]) -> Result<Vec<String>> {
    for arg in args {
        if arg.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
            return Err(Error::DangerousCharacter(arg.clone()));
        }
    }

    let mut sanitized = Vec::with_capacity(args.len());
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        if let Some(flag) = arg.strip_prefix("--") {
            let name = flag.split('=').next().unwrap_or("");
            if !ALLOWED_FLAGS.contains(&format!("--{name}").as_str()) {
                return Err(Error::DisallowedFlag(arg.clone()));
            }
            sanitized.push(arg.clone());
        } else if arg == "-n" {
            let Some(count) = iter.next() else {
                return Err(Error::InvalidN("missing count after -n".to_string()));
            };
            sanitized.push("-n".to_string());
            sanitized.push(parse_count(count)?);
        } else if let Some(count) = arg.strip_prefix("-n") {
            // attached form, -n20
            sanitized.push("-n".to_string());
            sanitized.push(parse_count(count)?);
        } else if arg.starts_with('-') {
            return Err(Error::DisallowedFlag(arg.clone()));
        } else {
            sanitized.push(arg.clone());
        }
    }
    Ok(sanitized)
}

fn parse_count(raw: &str) -> Result<String> {
    let count: u64 = raw
        .parse()
        .map_err(|_| Error::InvalidN(format!("'{raw}' is not a count")))?;
    if count == 0 {
        return Err(Error::InvalidN("count must be at least 1".to_string()));
    }
    Ok(count.min(MAX_LOG_COUNT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_allowed_flags_pass() {
        let sanitized = sanitize_git_log_args(&args(&[
            "--format=%H %s",
            "--author=pat",
            "--since=2026-01-01",
            "--until=2026-02-01",
            "--grep=Scope:",
            "--no-merges",
        ]))
        .unwrap();
        assert_eq!(sanitized.len(), 6);
    }

    #[test]
    fn test_dangerous_characters_rejected() {
        for bad in ["a|b", "x;y", "a&&b", "$HOME", "`id`", "a\\b"] {
            let err = sanitize_git_log_args(&args(&[bad])).unwrap_err();
            assert_eq!(err.tag(), "dangerous-character", "{bad}");
        }
    }

    #[test]
    fn test_dangerous_character_in_flag_value_rejected() {
        let err = sanitize_git_log_args(&args(&["--grep=foo|bar"])).unwrap_err();
        assert_eq!(err.tag(), "dangerous-character");
    }

    #[test]
    fn test_disallowed_flags_rejected() {
        for bad in ["--output=/tmp/x", "--exec-path", "-p", "--all"] {
            let err = sanitize_git_log_args(&args(&[bad])).unwrap_err();
            assert_eq!(err.tag(), "disallowed-flag", "{bad}");
        }
    }

    #[test]
    fn test_n_is_capped_at_fifty() {
        let sanitized = sanitize_git_log_args(&args(&["-n", "500"])).unwrap();
        assert_eq!(sanitized, args(&["-n", "50"]));

        let sanitized = sanitize_git_log_args(&args(&["-n", "10"])).unwrap();
        assert_eq!(sanitized, args(&["-n", "10"]));

        let sanitized = sanitize_git_log_args(&args(&["-n120"])).unwrap();
        assert_eq!(sanitized, args(&["-n", "50"]));
    }

    #[test]
    fn test_invalid_n_rejected() {
        for bad in [&["-n"][..], &["-n", "abc"], &["-n", "0"], &["-n", "-5"]] {
            let err = sanitize_git_log_args(&args(bad)).unwrap_err();
            assert_eq!(err.tag(), "invalid-n", "{bad:?}");
        }
    }

    #[test]
    fn test_positional_args_pass() {
        let sanitized = sanitize_git_log_args(&args(&["HEAD~20..HEAD", "--grep=cache"])).unwrap();
        assert_eq!(sanitized, args(&["HEAD~20..HEAD", "--grep=cache"]));
    }
}
