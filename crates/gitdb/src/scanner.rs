// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Incremental commit scanning
//!
//! A scan reads the commits added since the last indexed point, fetches the
//! files each one touched, and writes everything in one transaction. The index
//! state only moves after that transaction commits, so a failed scan leaves
//! the bookmark where it was and can simply be retried.
//!
//! # Example
//!
//! ```no_run
//! use gitdb::db::open_db;
//! use gitdb::scanner::{ScanOptions, scan_commits};
//! use gitdb_git::GitCli;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut db = open_db(std::path::Path::new("history.db"))?;
//! let git = GitCli::new(".");
//! let result = scan_commits(&mut db, &git, &ScanOptions::default()).await?;
//! println!("Indexed {} commits", result.indexed_count);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;

use futures::stream::{self, StreamExt, TryStreamExt};
use gitdb_git::{ChangedFile, ConventionalCommit, GitCommit, GitError, GitSource, LogOptions};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::{AuthorRecord, CommitBatch, CommitFileRecord, CommitRecord, Database, DbError};

/// Default bound on concurrent file-change reads
pub const DEFAULT_FILE_CONCURRENCY: usize = 16;

/// Scan errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] GitError),
}

/// Options for one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Start after this commit instead of the stored bookmark
    pub since_hash: Option<String>,
    /// Include merge commits
    pub include_merges: bool,
    /// Maximum commits to read
    pub limit: Option<usize>,
    /// Commits to skip before reading
    pub skip: Option<usize>,
    /// Concurrent file-change reads
    pub file_concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            since_hash: None,
            include_merges: false,
            limit: None,
            skip: None,
            file_concurrency: DEFAULT_FILE_CONCURRENCY,
        }
    }
}

impl ScanOptions {
    /// Start after `hash`, ignoring the stored bookmark
    #[must_use]
    pub fn since(mut self, hash: impl Into<String>) -> Self {
        self.since_hash = Some(hash.into());
        self
    }

    /// Read at most N commits
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first N commits
    #[must_use]
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Include merge commits
    #[must_use]
    pub fn with_merges(mut self) -> Self {
        self.include_merges = true;
        self
    }

    /// Set the file-read concurrency (at least 1)
    #[must_use]
    pub fn with_file_concurrency(mut self, n: usize) -> Self {
        self.file_concurrency = n.max(1);
        self
    }

    fn log_options(&self, since_hash: Option<String>) -> LogOptions {
        LogOptions {
            since_hash,
            include_merges: self.include_merges,
            limit: self.limit,
            skip: self.skip,
            ..LogOptions::default()
        }
    }
}

/// Outcome of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Bookmark after the scan
    pub last_indexed_hash: Option<String>,
    /// Date of the bookmarked commit
    pub last_indexed_date: Option<String>,
    /// Commits read in this scan
    pub indexed_count: usize,
}

/// Run one incremental scan
///
/// # Errors
///
/// Returns an error if git fails or the batch cannot be written. The index
/// state is unchanged in that case.
pub async fn scan_commits<G>(
    db: &mut Database,
    git: &G,
    options: &ScanOptions,
) -> Result<ScanResult, ScanError>
where
    G: GitSource + ?Sized,
{
    let state = db.index_state()?;
    let since_hash = options
        .since_hash
        .clone()
        .or_else(|| state.last_indexed_hash.clone());
    info!(since = ?since_hash, "Starting scan");

    let commits = git.read_commits(&options.log_options(since_hash)).await?;
    let Some(newest) = commits.first() else {
        info!("Index is up to date");
        return Ok(ScanResult {
            last_indexed_hash: state.last_indexed_hash,
            last_indexed_date: state.last_indexed_date,
            indexed_count: 0,
        });
    };

    let files = read_files(git, &commits, options.file_concurrency).await?;
    let batch = build_batch(&commits, files);
    let counts = db.index_commit_batch(&batch)?;

    let next = state.advanced_to(newest.hash.clone(), newest.date.clone());
    db.set_index_state(&next)?;
    debug!(hash = %newest.short_hash(), "Advanced index state");

    info!(
        commits = counts.commits,
        authors = counts.authors,
        files = counts.files,
        "Scan complete"
    );

    Ok(ScanResult {
        last_indexed_hash: next.last_indexed_hash,
        last_indexed_date: next.last_indexed_date,
        indexed_count: commits.len(),
    })
}

/// Fetch changed files for each commit, preserving commit order
async fn read_files<G>(
    git: &G,
    commits: &[GitCommit],
    concurrency: usize,
) -> Result<Vec<Vec<ChangedFile>>, GitError>
where
    G: GitSource + ?Sized,
{
    stream::iter(commits.iter().map(|c| git.read_changed_files(&c.hash)))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// Turn commits and their changed files into store rows
///
/// Authors are deduplicated by email across the whole batch; the first
/// (newest) name seen wins. `files` is indexed in parallel with `commits`.
#[must_use]
pub fn build_batch(commits: &[GitCommit], files: Vec<Vec<ChangedFile>>) -> CommitBatch {
    let mut seen = HashSet::new();
    let mut batch = CommitBatch::default();

    for commit in commits {
        let author = AuthorRecord::new(commit.author_name.clone(), &commit.author_email);
        if seen.insert(author.id.clone()) {
            batch.authors.push(author);
        }

        let cc = ConventionalCommit::parse(&commit.message);
        batch.commits.push(CommitRecord {
            hash: commit.hash.clone(),
            author_id: commit.author_email.to_lowercase(),
            date: commit.date.clone(),
            message: commit.message.clone(),
            body: commit.body.clone(),
            refs: commit.refs.clone(),
            kind: cc.kind,
            scope: cc.scope,
            is_breaking_change: cc.is_breaking_change,
        });
    }

    batch.files = files
        .into_iter()
        .flatten()
        .map(|f| CommitFileRecord {
            hash: f.hash,
            path: f.path,
            status: f.status,
        })
        .collect();

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn commit(hash: &str, email: &str, message: &str) -> GitCommit {
        GitCommit::from((hash, email, "2026-01-01T00:00:00+00:00", message))
    }

    fn changed(hash: &str, path: &str) -> ChangedFile {
        ChangedFile {
            hash: hash.to_string(),
            path: path.to_string(),
            status: "A".to_string(),
        }
    }

    #[test]
    fn test_scan_options_default() {
        let options = ScanOptions::default();
        assert_eq!(options.since_hash, None);
        assert!(!options.include_merges);
        assert_eq!(options.file_concurrency, DEFAULT_FILE_CONCURRENCY);
    }

    #[test]
    fn test_scan_options_builders() {
        let options = ScanOptions::default()
            .since("abc")
            .with_limit(5)
            .with_skip(2)
            .with_merges()
            .with_file_concurrency(0);

        assert_eq!(options.since_hash.as_deref(), Some("abc"));
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.skip, Some(2));
        assert!(options.include_merges);
        assert_eq!(options.file_concurrency, 1);
    }

    #[test]
    fn test_log_options_carry_scan_options() {
        let log = ScanOptions::default()
            .with_limit(3)
            .with_merges()
            .log_options(Some("h".to_string()));
        assert_eq!(log.since_hash.as_deref(), Some("h"));
        assert_eq!(log.limit, Some(3));
        assert!(log.include_merges);
        assert_eq!(log.since_date, None);
    }

    #[test]
    fn test_build_batch_dedups_authors() {
        let commits = vec![
            commit("h3", "alice@example.com", "chore: third"),
            commit("h2", "bob@example.com", "fix: second"),
            commit("h1", "Alice@Example.com", "feat: first"),
        ];
        let batch = build_batch(&commits, vec![vec![], vec![], vec![]]);

        let ids: Vec<&str> = batch.authors.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alice@example.com", "bob@example.com"]);
        assert_eq!(batch.commits.len(), 3);
        assert_eq!(batch.commits[2].author_id, "alice@example.com");
    }

    #[test]
    fn test_build_batch_parses_conventional_fields() {
        let commits = vec![
            commit("h2", "a@example.com", "feat(Repo)!: big change"),
            commit("h1", "a@example.com", "update readme"),
        ];
        let batch = build_batch(&commits, vec![vec![], vec![]]);

        assert_eq!(batch.commits[0].kind.as_deref(), Some("feat"));
        assert_eq!(batch.commits[0].scope.as_deref(), Some("repo"));
        assert_eq!(batch.commits[0].is_breaking_change, Some(true));

        assert_eq!(batch.commits[1].kind, None);
        assert_eq!(batch.commits[1].scope, None);
        assert_eq!(batch.commits[1].is_breaking_change, None);
    }

    #[test]
    fn test_build_batch_flattens_files() {
        let commits = vec![
            commit("h2", "a@example.com", "two"),
            commit("h1", "a@example.com", "one"),
        ];
        let files = vec![
            vec![changed("h2", "b.rs"), changed("h2", "c.rs")],
            vec![changed("h1", "a.rs")],
        ];
        let batch = build_batch(&commits, files);

        let paths: Vec<&str> = batch.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["b.rs", "c.rs", "a.rs"]);
        assert_eq!(batch.files[2].hash, "h1");
    }

    #[test]
    fn test_build_batch_empty() {
        let batch = build_batch(&[], Vec::new());
        assert!(batch.is_empty());
        assert!(batch.authors.is_empty());
    }
}
