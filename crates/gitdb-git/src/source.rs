// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! The narrow interface the indexer needs from version control

use async_trait::async_trait;

use crate::commit::{ChangedFile, GitCommit};
use crate::error::GitError;
use crate::log::LogOptions;

/// Read-only access to a repository's history
///
/// [`GitCli`](crate::GitCli) shells out to git; [`MemoryRepo`](crate::MemoryRepo)
/// serves a fixed linear history for tests.
#[async_trait]
pub trait GitSource: Send + Sync {
    /// Read commits newest-first
    async fn read_commits(&self, options: &LogOptions) -> Result<Vec<GitCommit>, GitError>;

    /// Read the paths changed by one commit
    async fn read_changed_files(&self, hash: &str) -> Result<Vec<ChangedFile>, GitError>;

    /// List tags matching a glob pattern
    ///
    /// With `newest_first` the result is sorted by descending version
    /// (`--sort=-v:refname`).
    async fn list_tags(&self, pattern: &str, newest_first: bool) -> Result<Vec<String>, GitError>;

    /// Hashes from `from` to `to` inclusive, oldest first (topological order)
    async fn resolve_hash_range(&self, from: &str, to: &str) -> Result<Vec<String>, GitError>;

    /// Resolve a tag, branch or hash to a commit hash
    ///
    /// Only a reference that does not exist yields
    /// [`GitError::InvalidReference`]; failures to run git are returned as
    /// they are.
    async fn resolve_ref(&self, reference: &str) -> Result<String, GitError>;

    /// Hash of the current HEAD
    async fn head_hash(&self) -> Result<String, GitError>;
}
