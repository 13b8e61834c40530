//! Working-memory persistence.
//!
//! A session-scoped, append-only log of tagged entries at
//! `<git-dir>/info/working-memory.json`. Every write replaces the whole
//! file atomically; the process is single-writer per session. A file whose
//! `sessionId` does not match the caller's session reads as absent, so a
//! stale file from a prior session never leaks into a new one.

pub mod consolidation;

use std::path::{Path, PathBuf};

use crate::git::GitRepo;
use crate::index::atomic_write;
use crate::models::{EntryTag, MemoryEntry, WorkingMemory};
use crate::{Error, Result};

/// Working-memory file name under `<git-dir>/info/`.
pub const WORKING_MEMORY_FILE: &str = "working-memory.json";

/// Default number of entries rendered by [`WorkingMemoryStore::format_block`].
pub const DEFAULT_FORMAT_ENTRIES: usize = 20;

/// Store handle bound to one file path and one session.
#[derive(Debug, Clone)]
pub struct WorkingMemoryStore {
    path: PathBuf,
    session_id: String,
}

impl WorkingMemoryStore {
    /// Creates a store for the repository's working-memory file.
    #[must_use]
    pub fn new(repo: &GitRepo, session_id: impl Into<String>) -> Self {
        Self {
            path: repo.info_dir().join(WORKING_MEMORY_FILE),
            session_id: session_id.into(),
        }
    }

    /// Creates a store at an explicit path.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
        }
    }

    /// The session this store reads and writes for.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The underlying file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads working memory for this session.
    ///
    /// A missing file or a file owned by another session reads as `None`.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or unparseable files.
    pub fn load(&self) -> Result<Option<WorkingMemory>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::IoFailed {
                    path: self.path.display().to_string(),
                    cause: e.to_string(),
                });
            },
        };
        let memory: WorkingMemory =
            serde_json::from_str(&json).map_err(|e| Error::OperationFailed {
                operation: "parse_working_memory".to_string(),
                cause: e.to_string(),
            })?;
        if memory.session_id != self.session_id {
            tracing::debug!(
                stored = %memory.session_id,
                current = %self.session_id,
                "working memory belongs to another session"
            );
            return Ok(None);
        }
        Ok(Some(memory))
    }

    /// Appends one entry, creating the file on first write.
    ///
    /// Returns the updated memory.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or replaced.
    pub fn add_entry(
        &self,
        tag: EntryTag,
        scope: Vec<String>,
        text: impl Into<String>,
        source: Option<String>,
    ) -> Result<WorkingMemory> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut memory = self
            .load()?
            .unwrap_or_else(|| WorkingMemory::new(&self.session_id, now.clone()));
        memory.entries.push(MemoryEntry {
            timestamp: now.clone(),
            tag,
            scope,
            text: text.into(),
            source,
        });
        memory.updated = now;
        self.save(&memory)?;
        Ok(memory)
    }

    /// Persists the whole file, replacing atomically.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be replaced.
    pub fn save(&self, memory: &WorkingMemory) -> Result<()> {
        let json = serde_json::to_string_pretty(memory).map_err(|e| Error::OperationFailed {
            operation: "serialize_working_memory".to_string(),
            cause: e.to_string(),
        })?;
        atomic_write(&self.path, &json)
    }

    /// Removes the file. Absence is success.
    ///
    /// # Errors
    ///
    /// Fails on other filesystem errors.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::IoFailed {
                path: self.path.display().to_string(),
                cause: e.to_string(),
            }),
        }
    }

    /// Renders the last `n` entries (default 20) as a tagged plain-text
    /// block for context injection.
    #[must_use]
    pub fn format_block(memory: &WorkingMemory, n: Option<usize>) -> String {
        let n = n.unwrap_or(DEFAULT_FORMAT_ENTRIES);
        let start = memory.entries.len().saturating_sub(n);
        let mut out = format!(
            "<working-memory session=\"{}\" entries=\"{}\">\n",
            memory.session_id,
            memory.entries.len()
        );
        for entry in &memory.entries[start..] {
            out.push_str(&format_entry(entry));
            out.push('\n');
        }
        out.push_str("</working-memory>");
        out
    }
}

fn format_entry(entry: &MemoryEntry) -> String {
    let mut line = format!("[{}]", entry.tag);
    if !entry.scope.is_empty() {
        line.push_str(&format!(" ({})", entry.scope.join(", ")));
    }
    line.push(' ');
    line.push_str(&entry.text);
    if let Some(source) = &entry.source {
        line.push_str(&format!(" (source: {source})"));
    }
    line
}
