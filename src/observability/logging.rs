//! Structured logging.
//!
//! Logs always go to stderr: hook stdout is reserved for context blocks
//! the host agent splices into the conversation.

use tracing_subscriber::EnvFilter;

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs.
    Json,
    /// Human-friendly logs for local debugging.
    Pretty,
}

/// Initializes the global subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init(verbose: bool) {
    let filter = resolve_filter(verbose);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match resolve_format() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    // an Err means a subscriber is already installed, which is fine
    drop(result);
}

fn resolve_filter(verbose: bool) -> EnvFilter {
    if let Ok(filter) = std::env::var("GITRECALL_LOG_FILTER") {
        return EnvFilter::new(filter);
    }
    if let Ok(level) = std::env::var("GITRECALL_LOG_LEVEL") {
        return EnvFilter::new(normalize_level(&level));
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let default_level = if verbose {
        "gitrecall=debug"
    } else {
        "gitrecall=info"
    };
    EnvFilter::new(default_level)
}

fn resolve_format() -> LogFormat {
    match std::env::var("GITRECALL_LOG_FORMAT")
        .unwrap_or_default()
        .to_lowercase()
        .as_str()
    {
        "json" => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

fn normalize_level(level: &str) -> String {
    let normalized = level.trim().to_lowercase();
    if normalized.contains('=') || normalized.contains(',') {
        normalized
    } else {
        format!("gitrecall={normalized}")
    }
}
