// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! An in-memory [`GitSource`] serving a fixed linear history
//!
//! Useful for exercising the indexer without spawning git.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::commit::{ChangedFile, GitCommit};
use crate::error::GitError;
use crate::log::LogOptions;
use crate::source::GitSource;

#[derive(Debug, Clone)]
struct Entry {
    commit: GitCommit,
    files: Vec<ChangedFile>,
    is_merge: bool,
}

/// A linear commit history held in memory
///
/// Commits are appended with [`MemoryRepo::push`], each becoming the new HEAD.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    /// Oldest first
    entries: Vec<Entry>,
    /// Tag name to hash, in creation order
    tags: Vec<(String, String)>,
    failing: HashSet<String>,
}

impl MemoryRepo {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit touching the given `(status, path)` pairs
    pub fn push(&mut self, commit: GitCommit, files: &[(&str, &str)]) -> &mut Self {
        self.push_entry(commit, files, false)
    }

    /// Append a merge commit
    pub fn push_merge(&mut self, commit: GitCommit) -> &mut Self {
        self.push_entry(commit, &[], true)
    }

    fn push_entry(&mut self, commit: GitCommit, files: &[(&str, &str)], is_merge: bool) -> &mut Self {
        let files = files
            .iter()
            .map(|(status, path)| ChangedFile {
                hash: commit.hash.clone(),
                path: (*path).to_string(),
                status: (*status).to_string(),
            })
            .collect();
        self.entries.push(Entry {
            commit,
            files,
            is_merge,
        });
        self
    }

    /// Tag a commit. Later tags count as newer.
    pub fn tag(&mut self, name: &str, hash: &str) -> &mut Self {
        self.tags.push((name.to_string(), hash.to_string()));
        self
    }

    /// Make file-change reads for `hash` fail
    pub fn fail_files_for(&mut self, hash: &str) -> &mut Self {
        self.failing.insert(hash.to_string());
        self
    }

    /// Number of commits in the history
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, reference: &str) -> Option<usize> {
        if reference == "HEAD" {
            return self.entries.len().checked_sub(1);
        }
        if let Some((_, hash)) = self.tags.iter().find(|(name, _)| name == reference) {
            return self.entries.iter().position(|e| &e.commit.hash == hash);
        }
        if reference.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .position(|e| e.commit.hash.starts_with(reference))
    }

    fn invalid(reference: &str) -> GitError {
        GitError::InvalidReference {
            reference: reference.to_string(),
        }
    }
}

fn matches_glob(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}

#[async_trait]
impl GitSource for MemoryRepo {
    async fn read_commits(&self, options: &LogOptions) -> Result<Vec<GitCommit>, GitError> {
        let stop = match options.since_hash {
            Some(ref since) => Some(self.position(since).ok_or_else(|| Self::invalid(since))?),
            None => None,
        };

        let commits = self
            .entries
            .iter()
            .enumerate()
            .rev()
            .take_while(|(idx, _)| stop.is_none_or(|s| *idx > s))
            .map(|(_, e)| e)
            .filter(|e| options.include_merges || !e.is_merge)
            .filter(|e| {
                let ts = e.commit.timestamp();
                let after = options
                    .since_date
                    .is_none_or(|since| ts.is_some_and(|t| t >= since));
                let before = options
                    .until_date
                    .is_none_or(|until| ts.is_some_and(|t| t <= until));
                after && before
            })
            .skip(options.skip.unwrap_or(0))
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|e| e.commit.clone())
            .collect();

        Ok(commits)
    }

    async fn read_changed_files(&self, hash: &str) -> Result<Vec<ChangedFile>, GitError> {
        if self.failing.contains(hash) {
            return Err(GitError::CommandFailed {
                command: format!("git show --name-status --pretty=format: {hash}"),
                status: "exit status: 128".to_string(),
                code: Some(128),
                stderr: format!("fatal: bad object {hash}"),
            });
        }
        let idx = self.position(hash).ok_or_else(|| Self::invalid(hash))?;
        Ok(self.entries[idx].files.clone())
    }

    async fn list_tags(&self, pattern: &str, newest_first: bool) -> Result<Vec<String>, GitError> {
        let mut tags: Vec<String> = self
            .tags
            .iter()
            .filter(|(name, _)| matches_glob(pattern, name))
            .map(|(name, _)| name.clone())
            .collect();
        if newest_first {
            tags.reverse();
        } else {
            tags.sort();
        }
        Ok(tags)
    }

    async fn resolve_hash_range(&self, from: &str, to: &str) -> Result<Vec<String>, GitError> {
        let start = self.position(from).ok_or_else(|| Self::invalid(from))?;
        let end = self.position(to).ok_or_else(|| Self::invalid(to))?;
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.entries[start..=end]
            .iter()
            .map(|e| e.commit.hash.clone())
            .collect())
    }

    async fn resolve_ref(&self, reference: &str) -> Result<String, GitError> {
        let idx = self
            .position(reference)
            .ok_or_else(|| Self::invalid(reference))?;
        Ok(self.entries[idx].commit.hash.clone())
    }

    async fn head_hash(&self) -> Result<String, GitError> {
        self.resolve_ref("HEAD").await
    }
}

/// Shorthand used when building fixture histories
impl From<(&str, &str, &str, &str)> for GitCommit {
    /// `(hash, author email, date, subject)`
    fn from((hash, email, date, message): (&str, &str, &str, &str)) -> Self {
        let name = email.split('@').next().unwrap_or(email);
        GitCommit {
            hash: hash.to_string(),
            author_name: name.to_string(),
            author_email: email.to_lowercase(),
            date: date.to_string(),
            message: message.to_string(),
            body: String::new(),
            refs: None,
        }
    }
}
