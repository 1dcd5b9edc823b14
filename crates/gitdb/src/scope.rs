// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Scope and range helpers for changelog and changeset builders
//!
//! Range helpers ask git for the reachable hashes between two commits and
//! keep only the indexed rows that match, in git's topological order. Every
//! other listing in the crate is ordered by date; this one is not.

use std::collections::HashMap;

use gitdb_git::{GitError, GitSource};
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;
use tracing::debug;

use crate::db::CommitRecord;
use crate::queries::{self, QueryError, escape_like};

/// Scope helper errors
#[derive(Debug, Error)]
pub enum ScopeError {
    /// Query error
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Git error
    #[error("Git error: {0}")]
    Git(#[from] GitError),
}

impl From<rusqlite::Error> for ScopeError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Query(QueryError::Sqlite(e))
    }
}

/// Tag prefix used for a scope's releases (`cli` -> `cli@`)
#[must_use]
pub fn tag_prefix(scope: &str) -> String {
    format!("{scope}@")
}

/// The earliest indexed commit for a scope
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn first_commit_for_scope(
    conn: &Connection,
    scope: &str,
) -> Result<Option<CommitRecord>, ScopeError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM commits WHERE scope = ?1 ORDER BY date ASC, hash LIMIT 1",
                CommitRecord::COLUMNS
            ),
            [scope.to_lowercase()],
            CommitRecord::from_row,
        )
        .optional()?)
}

/// Commits whose ref decoration carries a tag starting with `prefix`
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn commits_with_tag_marker(
    conn: &Connection,
    prefix: &str,
) -> Result<Vec<CommitRecord>, ScopeError> {
    let pattern = format!("%tag: {}%", escape_like(prefix));
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM commits WHERE refs LIKE ?1 ESCAPE '\\' ORDER BY date DESC, hash",
        CommitRecord::COLUMNS
    ))?;
    let rows = stmt.query_map([pattern], CommitRecord::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Newest tag starting with `prefix`, by version sort
///
/// # Errors
///
/// Returns an error if git fails.
pub async fn latest_tag<G>(git: &G, prefix: &str) -> Result<Option<String>, ScopeError>
where
    G: GitSource + ?Sized,
{
    let tags = git.list_tags(&format!("{prefix}*"), true).await?;
    Ok(tags.into_iter().next())
}

/// Reachable hashes from `from` to `to`, inclusive, oldest first
///
/// Unknown references yield an empty list; any other git failure is an
/// error.
async fn hash_range<G>(git: &G, from: &str, to: &str) -> Result<Vec<String>, ScopeError>
where
    G: GitSource + ?Sized,
{
    let (from_hash, to_hash) = match futures::try_join!(git.resolve_ref(from), git.resolve_ref(to))
    {
        Ok(pair) => pair,
        Err(GitError::InvalidReference { reference }) => {
            debug!(reference = %reference, "Unknown reference in range");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    Ok(git.resolve_hash_range(&from_hash, &to_hash).await?)
}

/// Keep the rows whose hash appears in `order`, in that order
fn in_git_order(order: Vec<String>, rows: Vec<CommitRecord>) -> Vec<CommitRecord> {
    let mut by_hash: HashMap<String, CommitRecord> =
        rows.into_iter().map(|c| (c.hash.clone(), c)).collect();
    order
        .into_iter()
        .filter_map(|hash| by_hash.remove(&hash))
        .collect()
}

/// Commits of `scope` between two references, inclusive, in git order
///
/// # Errors
///
/// Returns an error if git or the query fails.
pub async fn commits_in_range_for_scope<G>(
    conn: &Connection,
    git: &G,
    from: &str,
    to: &str,
    scope: &str,
) -> Result<Vec<CommitRecord>, ScopeError>
where
    G: GitSource + ?Sized,
{
    let order = hash_range(git, from, to).await?;
    if order.is_empty() {
        return Ok(Vec::new());
    }
    let rows = queries::find_commits_by_scope(conn, scope)?;
    Ok(in_git_order(order, rows))
}

/// Commits touching paths under `prefix` between two references, in git order
///
/// # Errors
///
/// Returns an error if git or the query fails.
pub async fn commits_in_range_for_path<G>(
    conn: &Connection,
    git: &G,
    from: &str,
    to: &str,
    prefix: &str,
) -> Result<Vec<CommitRecord>, ScopeError>
where
    G: GitSource + ?Sized,
{
    let order = hash_range(git, from, to).await?;
    if order.is_empty() {
        return Ok(Vec::new());
    }
    let rows = queries::find_commits_by_path(conn, prefix)?;
    Ok(in_git_order(order, rows))
}

/// Commits of `scope` after its latest `<scope>@` tag, up to HEAD
///
/// Without a tag the range starts at the scope's first indexed commit. The
/// tagged commit itself is excluded.
///
/// # Errors
///
/// Returns an error if git or the query fails.
pub async fn commits_since_latest_tag<G>(
    conn: &Connection,
    git: &G,
    scope: &str,
) -> Result<Vec<CommitRecord>, ScopeError>
where
    G: GitSource + ?Sized,
{
    let head = git.head_hash().await?;

    let Some(tag) = latest_tag(git, &tag_prefix(scope)).await? else {
        let Some(first) = first_commit_for_scope(conn, scope)? else {
            return Ok(Vec::new());
        };
        debug!(scope, from = %first.hash, "No release tag, using first scoped commit");
        return commits_in_range_for_scope(conn, git, &first.hash, &head, scope).await;
    };

    let tagged = git.resolve_ref(&tag).await?;
    debug!(scope, tag = %tag, "Collecting commits since tag");
    let mut commits = commits_in_range_for_scope(conn, git, &tagged, &head, scope).await?;
    commits.retain(|c| c.hash != tagged);
    Ok(commits)
}
