//! The trailer index.
//!
//! An inverted index from intent, scope, session, and decided-against
//! trailers to commit hashes, persisted as pretty-printed JSON at
//! `<git-dir>/info/trailer-index.json`. The index is rebuilt explicitly by
//! an operator task and loaded read-only by hooks; a stored `headCommit`
//! that differs from the current HEAD makes the index read as absent so
//! callers can fall back to live `git log --grep`.
//!
//! Buckets hold hashes in `git log` insertion order (reverse chronological)
//! and query results preserve that order; `IndexMap` keeps the JSON object
//! order stable across a save/load round trip.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::git::GitRepo;
use crate::matching::{scope_matches, word_boundary_match};
use crate::models::{IndexedCommit, Intent, StructuredCommit};
use crate::trailers;
use crate::{Error, Result};

/// Current index schema version.
pub const INDEX_VERSION: u32 = 1;

/// Index file name under `<git-dir>/info/`.
pub const INDEX_FILE: &str = "trailer-index.json";

/// Default query result limit.
pub const DEFAULT_QUERY_LIMIT: usize = 20;

/// Query parameters for the index.
///
/// Each present filter intersects the candidate set; with no filter at all
/// the query returns nothing — the API is "commits matching these
/// dimensions", not "all commits".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParams {
    /// Hierarchical scope pattern.
    pub scope: Option<String>,
    /// Intents to union before intersecting.
    pub intents: Option<Vec<Intent>>,
    /// Exact session id.
    pub session: Option<String>,
    /// Word-boundary keyword against decided-against entries.
    pub decided_against: Option<String>,
    /// Result cap, default 20.
    pub limit: Option<usize>,
}

impl QueryParams {
    /// Whether no filter is present.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.scope.is_none()
            && self.intents.is_none()
            && self.session.is_none()
            && self.decided_against.is_none()
    }

    /// Sets the scope pattern.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the intents filter.
    #[must_use]
    pub fn with_intents(mut self, intents: Vec<Intent>) -> Self {
        self.intents = Some(intents);
        self
    }

    /// Sets the session filter.
    #[must_use]
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Sets the decided-against keyword.
    #[must_use]
    pub fn with_decided_against(mut self, keyword: impl Into<String>) -> Self {
        self.decided_against = Some(keyword.into());
        self
    }

    /// Sets the result cap.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The persisted inverted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailerIndex {
    /// Schema version.
    pub version: u32,
    /// Build timestamp, ISO 8601.
    pub generated: String,
    /// HEAD hash at build time; the freshness stamp.
    pub head_commit: String,
    /// Number of indexed commits.
    pub commit_count: usize,
    /// intent → hashes.
    pub by_intent: IndexMap<Intent, Vec<String>>,
    /// exact scope key → hashes. Keys are stored verbatim; hierarchy is
    /// applied at query time.
    pub by_scope: IndexMap<String, Vec<String>>,
    /// session id → hashes.
    pub by_session: IndexMap<String, Vec<String>>,
    /// Hashes carrying at least one decided-against entry.
    pub with_decided_against: Vec<String>,
    /// hash → compact commit record.
    pub commits: IndexMap<String, IndexedCommit>,
}

impl TrailerIndex {
    /// Creates an empty index stamped with a head commit and timestamp.
    #[must_use]
    pub fn empty(head_commit: impl Into<String>, generated: impl Into<String>) -> Self {
        Self {
            version: INDEX_VERSION,
            generated: generated.into(),
            head_commit: head_commit.into(),
            commit_count: 0,
            by_intent: IndexMap::new(),
            by_scope: IndexMap::new(),
            by_session: IndexMap::new(),
            with_decided_against: Vec::new(),
            commits: IndexMap::new(),
        }
    }

    /// Builds the index from the repository's full `git log`.
    ///
    /// Records that fail to parse are skipped, not fatal: history predating
    /// the commit conventions is expected.
    ///
    /// # Errors
    ///
    /// Fails when git itself fails or the repository has no HEAD.
    pub fn build(repo: &GitRepo) -> Result<Self> {
        let head = repo.head()?;
        let text = repo.log_records(None)?;
        let mut index = Self::empty(head, chrono::Utc::now().to_rfc3339());

        let mut skipped = 0_usize;
        for block in trailers::split_records(&text) {
            match trailers::parse_record(block) {
                Ok(commit) => index.insert(&commit),
                Err(err) => {
                    skipped += 1;
                    tracing::debug!(error = %err, "skipping unparseable commit record");
                },
            }
        }
        tracing::info!(
            commits = index.commit_count,
            skipped,
            head = %index.head_commit,
            "trailer index built"
        );
        Ok(index)
    }

    /// Inserts one parsed commit into every applicable bucket.
    pub fn insert(&mut self, commit: &StructuredCommit) {
        let hash = commit.hash.clone();

        if let Some(intent) = commit.intent {
            self.by_intent.entry(intent).or_default().push(hash.clone());
        }
        for scope in &commit.scope {
            self.by_scope
                .entry(scope.clone())
                .or_default()
                .push(hash.clone());
        }
        if let Some(session) = &commit.session {
            self.by_session
                .entry(session.clone())
                .or_default()
                .push(hash.clone());
        }
        if !commit.decided_against.is_empty() && !self.with_decided_against.contains(&hash) {
            self.with_decided_against.push(hash.clone());
        }

        self.commits.insert(hash, commit.to_indexed());
        self.commit_count = self.commits.len();
    }

    /// All stored scope keys, verbatim, in insertion order.
    #[must_use]
    pub fn scope_keys(&self) -> Vec<String> {
        self.by_scope.keys().cloned().collect()
    }

    /// Answers a query with the null-candidate intersection algorithm.
    ///
    /// Results follow index insertion order and are truncated to the limit.
    #[must_use]
    pub fn query(&self, params: &QueryParams) -> Vec<&IndexedCommit> {
        let mut candidates: Option<Vec<String>> = None;

        if let Some(intents) = &params.intents {
            let mut matched = Vec::new();
            for intent in intents {
                if let Some(bucket) = self.by_intent.get(intent) {
                    for hash in bucket {
                        if !matched.contains(hash) {
                            matched.push(hash.clone());
                        }
                    }
                }
            }
            candidates = Some(intersect(candidates, matched));
        }

        if let Some(session) = &params.session {
            let matched = self.by_session.get(session).cloned().unwrap_or_default();
            candidates = Some(intersect(candidates, matched));
        }

        if let Some(keyword) = &params.decided_against {
            let matched: Vec<String> = self
                .with_decided_against
                .iter()
                .filter(|hash| {
                    self.commits.get(*hash).is_some_and(|commit| {
                        commit
                            .decided_against
                            .iter()
                            .any(|entry| word_boundary_match(entry, keyword))
                    })
                })
                .cloned()
                .collect();
            candidates = Some(intersect(candidates, matched));
        }

        if let Some(pattern) = &params.scope {
            let mut matched = Vec::new();
            for (key, bucket) in &self.by_scope {
                if scope_matches(key, pattern) {
                    for hash in bucket {
                        if !matched.contains(hash) {
                            matched.push(hash.clone());
                        }
                    }
                }
            }
            candidates = Some(intersect(candidates, matched));
        }

        let Some(mut hashes) = candidates else {
            return Vec::new();
        };

        // index insertion order, then the cap
        hashes.sort_by_key(|hash| self.commits.get_index_of(hash).unwrap_or(usize::MAX));
        hashes
            .into_iter()
            .take(params.limit.unwrap_or(DEFAULT_QUERY_LIMIT))
            .filter_map(|hash| self.commits.get(&hash))
            .collect()
    }

    /// The index file path for a repository.
    #[must_use]
    pub fn path_for(repo: &GitRepo) -> PathBuf {
        repo.info_dir().join(INDEX_FILE)
    }

    /// Persists the index as pretty-printed JSON, replacing atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoFailed`] on write failure.
    pub fn save(&self, repo: &GitRepo) -> Result<()> {
        let path = Self::path_for(repo);
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::OperationFailed {
            operation: "serialize_index".to_string(),
            cause: e.to_string(),
        })?;
        atomic_write(&path, &json)
    }

    /// Loads the index and verifies freshness against the current HEAD.
    ///
    /// A missing file, an unknown schema version, or a stale `headCommit`
    /// all read as `None`.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files or when HEAD cannot be resolved.
    pub fn load_fresh(repo: &GitRepo) -> Result<Option<Self>> {
        let Some(index) = Self::load_file(&Self::path_for(repo))? else {
            return Ok(None);
        };
        let head = repo.head()?;
        if index.head_commit != head {
            tracing::debug!(
                stored = %index.head_commit,
                head = %head,
                "trailer index is stale"
            );
            return Ok(None);
        }
        Ok(Some(index))
    }

    /// Loads the index file without the freshness check.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or unparseable files.
    pub fn load_file(path: &Path) -> Result<Option<Self>> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::IoFailed {
                    path: path.display().to_string(),
                    cause: e.to_string(),
                });
            },
        };
        let index: Self = serde_json::from_str(&json).map_err(|e| Error::OperationFailed {
            operation: "parse_index".to_string(),
            cause: e.to_string(),
        })?;
        if index.version != INDEX_VERSION {
            return Ok(None);
        }
        Ok(Some(index))
    }
}

/// Live `git log --grep` fallback for a stale or missing index.
///
/// Greps commit messages for every pattern, parses the matching records,
/// and returns compact commits in log order.
///
/// # Errors
///
/// Returns [`Error::GitLogFailed`] when the subprocess fails.
pub fn live_grep(repo: &GitRepo, patterns: &[String], limit: usize) -> Result<Vec<IndexedCommit>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let text = repo.log_grep(patterns, limit)?;
    Ok(trailers::split_records(&text)
        .filter_map(|block| trailers::parse_record(block).ok())
        .map(|commit| commit.to_indexed())
        .collect())
}

/// Intersects the running candidate set with a filter's matches.
fn intersect(candidates: Option<Vec<String>>, matched: Vec<String>) -> Vec<String> {
    match candidates {
        None => matched,
        Some(previous) => previous
            .into_iter()
            .filter(|hash| matched.contains(hash))
            .collect(),
    }
}

/// Whole-file atomic replace: write a sibling temp file, then rename.
///
/// Both JSON files and the session summaries are written this way so
/// concurrent readers only ever see complete contents.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::IoFailed {
            path: parent.display().to_string(),
            cause: e.to_string(),
        })?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).map_err(|e| Error::IoFailed {
        path: tmp.display().to_string(),
        cause: e.to_string(),
    })?;
    std::fs::rename(&tmp, path).map_err(|e| Error::IoFailed {
        path: path.display().to_string(),
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommitType;

    fn commit(
        hash: &str,
        scope: &[&str],
        intent: Option<Intent>,
        decided_against: &[&str],
        session: Option<&str>,
    ) -> StructuredCommit {
        StructuredCommit {
            hash: hash.to_string(),
            date: "2026-02-01T00:00:00+00:00".to_string(),
            commit_type: CommitType::Fix,
            header_scope: None,
            subject: format!("subject for {hash}"),
            body: String::new(),
            intent,
            scope: scope.iter().map(ToString::to_string).collect(),
            decided_against: decided_against.iter().map(ToString::to_string).collect(),
            session: session.map(String::from),
            refs: Vec::new(),
            context: None,
            breaking: None,
        }
    }

    fn sample_index() -> TrailerIndex {
        let mut index = TrailerIndex::empty("headhash", "2026-02-01T00:00:00+00:00");
        index.insert(&commit(
            "aaa",
            &["auth/login"],
            Some(Intent::FixDefect),
            &[],
            None,
        ));
        index.insert(&commit(
            "bbb",
            &["cache"],
            Some(Intent::FixDefect),
            &["Redis sentinel"],
            Some("2026-01-30/cache-work"),
        ));
        index.insert(&commit(
            "ccc",
            &["auth"],
            Some(Intent::EnableCapability),
            &[],
            None,
        ));
        index
    }

    fn hashes(commits: &[&IndexedCommit]) -> Vec<String> {
        commits.iter().map(|c| c.hash.clone()).collect()
    }

    #[test]
    fn test_query_scope_is_hierarchical_and_ordered() {
        let index = sample_index();
        let result = index.query(&QueryParams::default().with_scope("auth"));
        assert_eq!(hashes(&result), vec!["aaa", "ccc"]);
    }

    #[test]
    fn test_query_decided_against_word_boundary() {
        let index = sample_index();
        let result = index.query(&QueryParams::default().with_decided_against("Redis"));
        assert_eq!(hashes(&result), vec!["bbb"]);

        let none = index.query(&QueryParams::default().with_decided_against("Red"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_query_intersects_filters() {
        let index = sample_index();
        let result = index.query(
            &QueryParams::default()
                .with_intents(vec![Intent::FixDefect])
                .with_scope("cache"),
        );
        assert_eq!(hashes(&result), vec!["bbb"]);

        let none = index.query(
            &QueryParams::default()
                .with_intents(vec![Intent::EnableCapability])
                .with_scope("cache"),
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_query_without_filters_returns_empty() {
        let index = sample_index();
        assert!(index.query(&QueryParams::default()).is_empty());
        assert!(QueryParams::default().is_unconstrained());
    }

    #[test]
    fn test_query_session() {
        let index = sample_index();
        let result = index.query(&QueryParams::default().with_session("2026-01-30/cache-work"));
        assert_eq!(hashes(&result), vec!["bbb"]);
    }

    #[test]
    fn test_query_limit_truncates_in_insertion_order() {
        let mut index = TrailerIndex::empty("head", "now");
        for i in 0..30 {
            index.insert(&commit(
                &format!("c{i:02}"),
                &["api"],
                Some(Intent::FixDefect),
                &[],
                None,
            ));
        }
        let result = index.query(&QueryParams::default().with_scope("api"));
        assert_eq!(result.len(), DEFAULT_QUERY_LIMIT);
        assert_eq!(result[0].hash, "c00");

        let five = index.query(&QueryParams::default().with_scope("api").with_limit(5));
        assert_eq!(five.len(), 5);
    }

    #[test]
    fn test_bucket_invariants() {
        let index = sample_index();
        for bucket in index
            .by_intent
            .values()
            .chain(index.by_scope.values())
            .chain(index.by_session.values())
        {
            for hash in bucket {
                assert!(index.commits.contains_key(hash));
            }
        }
        for (intent, bucket) in &index.by_intent {
            for hash in bucket {
                assert_eq!(index.commits[hash].intent, Some(*intent));
            }
        }
        for hash in &index.with_decided_against {
            assert!(!index.commits[hash].decided_against.is_empty());
        }
    }

    #[test]
    fn test_save_load_roundtrip_preserves_order() {
        let index = sample_index();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE);
        let json = serde_json::to_string_pretty(&index).unwrap();
        std::fs::write(&path, json).unwrap();

        let loaded = TrailerIndex::load_file(&path).unwrap().unwrap();
        assert_eq!(loaded.commit_count, 3);
        assert_eq!(
            loaded.commits.keys().collect::<Vec<_>>(),
            vec!["aaa", "bbb", "ccc"]
        );
        let result = loaded.query(&QueryParams::default().with_scope("auth"));
        assert_eq!(hashes(&result), vec!["aaa", "ccc"]);
    }

    #[test]
    fn test_load_file_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(INDEX_FILE);
        assert!(TrailerIndex::load_file(&missing).unwrap().is_none());
    }

    #[test]
    fn test_unknown_version_reads_as_absent() {
        let mut index = sample_index();
        index.version = 9;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INDEX_FILE);
        std::fs::write(&path, serde_json::to_string(&index).unwrap()).unwrap();
        assert!(TrailerIndex::load_file(&path).unwrap().is_none());
    }
}
