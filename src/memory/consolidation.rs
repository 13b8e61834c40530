//! Session consolidation.
//!
//! Turns a session's working memory into a Markdown summary and
//! commit-trailer suggestions when the session ends.

use indexmap::IndexMap;

use crate::models::{EntryTag, MemoryEntry, WorkingMemory};

/// Section order for the session summary.
const SECTION_ORDER: [(EntryTag, &str); 5] = [
    (EntryTag::Decision, "Decisions"),
    (EntryTag::Finding, "Findings"),
    (EntryTag::Hypothesis, "Hypotheses"),
    (EntryTag::Context, "Context"),
    (EntryTag::Todo, "TODOs"),
];

/// Commit-trailer suggestions derived from a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrailerSuggestions {
    /// One `Decided-Against:` candidate per decision entry.
    pub decided_against: Vec<String>,
    /// Union of all entry scopes, sorted.
    pub scopes: Vec<String>,
}

impl TrailerSuggestions {
    /// Whether there is nothing to suggest.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decided_against.is_empty() && self.scopes.is_empty()
    }
}

/// Partitions entries by tag, preserving entry order within each group.
#[must_use]
pub fn group_by_tag(entries: &[MemoryEntry]) -> IndexMap<EntryTag, Vec<&MemoryEntry>> {
    let mut groups: IndexMap<EntryTag, Vec<&MemoryEntry>> = IndexMap::new();
    for entry in entries {
        groups.entry(entry.tag).or_default().push(entry);
    }
    groups
}

/// Unions and sorts the scopes of all entries.
#[must_use]
pub fn collect_scopes(entries: &[MemoryEntry]) -> Vec<String> {
    let mut scopes: Vec<String> = entries
        .iter()
        .flat_map(|entry| entry.scope.iter().cloned())
        .collect();
    scopes.sort();
    scopes.dedup();
    scopes
}

/// Derives trailer suggestions from a session's entries.
///
/// Every `decision`-tagged entry's text becomes a `Decided-Against:`
/// candidate, affirmative decisions included; the stop hook labels them
/// candidates so an operator curates before committing.
#[must_use]
pub fn decisions_to_trailers(entries: &[MemoryEntry]) -> TrailerSuggestions {
    TrailerSuggestions {
        decided_against: entries
            .iter()
            .filter(|entry| entry.tag == EntryTag::Decision)
            .map(|entry| entry.text.clone())
            .collect(),
        scopes: collect_scopes(entries),
    }
}

/// Renders the Markdown session summary.
#[must_use]
pub fn format_session_summary(memory: &WorkingMemory) -> String {
    let groups = group_by_tag(&memory.entries);
    let scopes = collect_scopes(&memory.entries);

    let mut out = format!("# Session summary: {}\n\n", memory.session_id);
    out.push_str(&format!(
        "- Started: {}\n- Last update: {}\n- Entries: {}\n",
        memory.created,
        memory.updated,
        memory.entries.len()
    ));
    if !scopes.is_empty() {
        out.push_str(&format!("- Scopes: {}\n", scopes.join(", ")));
    }

    for (tag, title) in SECTION_ORDER {
        let Some(entries) = groups.get(&tag) else {
            continue;
        };
        out.push_str(&format!("\n## {title}\n\n"));
        for entry in entries {
            out.push_str(&format_bullet(entry));
            out.push('\n');
        }
    }
    out
}

/// Renders the trailer-hints block: a `Scope:` line (if any scopes were
/// collected) followed by one `Decided-Against:` line per rejection.
#[must_use]
pub fn format_trailer_hints(suggestions: &TrailerSuggestions) -> String {
    let mut out = String::new();
    if !suggestions.scopes.is_empty() {
        out.push_str(&format!("Scope: {}\n", suggestions.scopes.join(", ")));
    }
    for rejected in &suggestions.decided_against {
        out.push_str(&format!("Decided-Against: {rejected}\n"));
    }
    out
}

/// File name for the persisted summary of a session.
///
/// The slug is the part after the date; path separators are flattened so
/// the name stays a single file under `<git-dir>/info/`.
#[must_use]
pub fn summary_file_name(session_id: &str) -> String {
    let slug = session_id.split_once('/').map_or(session_id, |(_, s)| s);
    let slug: String = slug
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("session-summary-{slug}.md")
}

fn format_bullet(entry: &MemoryEntry) -> String {
    let mut line = format!("- {}", entry.text);
    if !entry.scope.is_empty() {
        line.push_str(&format!(" [{}]", entry.scope.join(", ")));
    }
    if let Some(source) = &entry.source {
        line.push_str(&format!(" (source: {source})"));
    }
    line
}
