// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Command dispatch for the `git-db` binary
//!
//! Each subcommand runs against an open database and a [`GitSource`] and
//! produces a JSON value for the caller to print.

use gitdb_git::GitSource;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::{Command, Config, Query};
use crate::db::{Database, DbError};
use crate::queries::{self, QueryError};
use crate::scanner::{ScanError, scan_commits};
use crate::scope::{self, ScopeError, tag_prefix};

/// Command errors
#[derive(Debug, Error)]
pub enum CommandError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Scan failed; the index state was not advanced
    #[error("Scan failed: {0}. The index was left unchanged; re-run to retry.")]
    Scan(#[from] ScanError),

    /// Query error
    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    /// Scope helper error
    #[error("Scope query failed: {0}")]
    Scope(#[from] ScopeError),

    /// JSON serialization error
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, CommandError> {
    Ok(serde_json::to_value(value)?)
}

/// Run the configured command
///
/// With no subcommand this performs a scan.
///
/// # Errors
///
/// Returns an error if the command fails.
pub async fn run<G>(config: &Config, db: &mut Database, git: &G) -> Result<Value, CommandError>
where
    G: GitSource + ?Sized,
{
    match &config.command {
        None | Some(Command::Scan { .. }) => {
            let result = scan_commits(db, git, &config.scan_options()).await?;
            to_json(&result)
        }
        Some(Command::State) => to_json(&db.index_state()?),
        Some(Command::Query(query)) => run_query(query, db, git).await,
    }
}

/// Run one query subcommand
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn run_query<G>(query: &Query, db: &Database, git: &G) -> Result<Value, CommandError>
where
    G: GitSource + ?Sized,
{
    let conn = db.connection();
    match query {
        Query::Commits { .. } => to_json(&queries::list_commits(conn, query.page())?),
        Query::Commit { hash } => match queries::get_commit(conn, hash)? {
            Some(commit) => Ok(json!({
                "commit": commit,
                "files": queries::commit_files(conn, hash)?,
            })),
            None => Ok(Value::Null),
        },
        Query::Message { text } => to_json(&queries::find_commits_by_message(conn, text)?),
        Query::Between { from, to } => to_json(&queries::find_commits_between(conn, from, to)?),
        Query::Dates { from, to } => {
            to_json(&queries::find_commits_between_dates(conn, from, to)?)
        }
        Query::Author { email } => to_json(&queries::find_commits_by_author_email(conn, email)?),
        Query::Type { kind } => to_json(&queries::find_commits_by_type(conn, kind)?),
        Query::Scope { scope } => to_json(&queries::find_commits_by_scope(conn, scope)?),
        Query::Path { prefix } => to_json(&queries::find_commits_by_path(conn, prefix)?),
        Query::Package { path } => to_json(&queries::find_commits_by_package(conn, path)?),
        Query::Authors { query: None } => to_json(&queries::list_authors(conn)?),
        Query::Authors { query: Some(q) } => to_json(&queries::find_authors(conn, q)?),
        Query::Files { .. } => to_json(&queries::list_files(conn, query.page())?),
        Query::Meta => to_json(&queries::list_meta(conn)?),
        Query::LatestTag { scope } => {
            to_json(&scope::latest_tag(git, &tag_prefix(scope)).await?)
        }
        Query::ScopeRange { scope, from, to } => to_json(
            &scope::commits_in_range_for_scope(conn, git, from, to, scope).await?,
        ),
        Query::PathRange { prefix, from, to } => to_json(
            &scope::commits_in_range_for_path(conn, git, from, to, prefix).await?,
        ),
        Query::Unreleased { scope } => {
            to_json(&scope::commits_since_latest_tag(conn, git, scope).await?)
        }
    }
}
