//! Query helper functions for the git-db store
//!
//! Every accessor is a single parameterized query against an open
//! connection. Commit listings are newest-first by `date`; unknown hashes,
//! authors or paths produce an empty result or `None`, never an error.

use gitdb_git::log::normalize_date;
use rusqlite::{Connection, OptionalExtension, Params, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{AuthorRecord, CommitFileRecord, CommitRecord, MetaEntry};

/// Query errors
#[derive(Debug, Error)]
pub enum QueryError {
    /// SQLite error during query
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Limit/offset pagination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum rows to return; `None` returns everything
    pub limit: Option<usize>,
    /// Rows to skip
    pub offset: Option<usize>,
}

impl Page {
    /// First `limit` rows
    #[must_use]
    pub fn first(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
        }
    }

    /// Skip `offset` rows
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    // SQLite treats a negative LIMIT as "no limit"
    fn sql_limit(&self) -> i64 {
        self.limit.map_or(-1, |l| l as i64)
    }

    fn sql_offset(&self) -> i64 {
        self.offset.map_or(0, |o| o as i64)
    }
}

/// Escape `\`, `%` and `_` for a `LIKE ... ESCAPE '\'` pattern
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn collect_commits<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<CommitRecord>, QueryError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, CommitRecord::from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

fn author_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuthorRecord> {
    Ok(AuthorRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

fn file_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommitFileRecord> {
    Ok(CommitFileRecord {
        hash: row.get(0)?,
        path: row.get(1)?,
        status: row.get(2)?,
    })
}

// ============================================================================
// Commits
// ============================================================================

/// List all commits, newest first
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_commits(conn: &Connection, page: Page) -> Result<Vec<CommitRecord>, QueryError> {
    collect_commits(
        conn,
        &format!(
            "SELECT {} FROM commits ORDER BY date DESC, hash LIMIT ?1 OFFSET ?2",
            CommitRecord::COLUMNS
        ),
        params![page.sql_limit(), page.sql_offset()],
    )
}

/// Get one commit by full hash
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_commit(conn: &Connection, hash: &str) -> Result<Option<CommitRecord>, QueryError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM commits WHERE hash = ?1",
                CommitRecord::COLUMNS
            ),
            [hash],
            CommitRecord::from_row,
        )
        .optional()?)
}

/// Count indexed commits
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_commits(conn: &Connection) -> Result<i64, QueryError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM commits", [], |row| row.get(0))?)
}

/// Commits whose subject contains `substring` literally
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_commits_by_message(
    conn: &Connection,
    substring: &str,
) -> Result<Vec<CommitRecord>, QueryError> {
    let pattern = format!("%{}%", escape_like(substring));
    collect_commits(
        conn,
        &format!(
            "SELECT {} FROM commits WHERE message LIKE ?1 ESCAPE '\\' ORDER BY date DESC, hash",
            CommitRecord::COLUMNS
        ),
        [pattern],
    )
}

fn commit_date(conn: &Connection, hash: &str) -> Result<Option<String>, QueryError> {
    Ok(conn
        .query_row("SELECT date FROM commits WHERE hash = ?1", [hash], |row| {
            row.get(0)
        })
        .optional()?)
}

/// Commits dated between two commits, inclusive, newest first
///
/// Argument order does not matter. Empty if either hash is not indexed.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_commits_between(
    conn: &Connection,
    from_hash: &str,
    to_hash: &str,
) -> Result<Vec<CommitRecord>, QueryError> {
    let (Some(a), Some(b)) = (commit_date(conn, from_hash)?, commit_date(conn, to_hash)?) else {
        return Ok(Vec::new());
    };
    date_range(conn, &a, &b)
}

/// Commits dated between two ISO-8601 dates, inclusive, newest first
///
/// Dates with an offset are compared in UTC. Argument order does not matter.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_commits_between_dates(
    conn: &Connection,
    from: &str,
    to: &str,
) -> Result<Vec<CommitRecord>, QueryError> {
    date_range(conn, &normalize_date(from), &normalize_date(to))
}

fn date_range(conn: &Connection, a: &str, b: &str) -> Result<Vec<CommitRecord>, QueryError> {
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    collect_commits(
        conn,
        &format!(
            "SELECT {} FROM commits WHERE date BETWEEN ?1 AND ?2 ORDER BY date DESC, hash",
            CommitRecord::COLUMNS
        ),
        [start, end],
    )
}

/// Commits by one author, matched on email case-insensitively
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_commits_by_author_email(
    conn: &Connection,
    email: &str,
) -> Result<Vec<CommitRecord>, QueryError> {
    collect_commits(
        conn,
        &format!(
            "SELECT {} FROM commits c
             JOIN authors a ON a.id = c.author_id
             WHERE a.email = ?1
             ORDER BY c.date DESC, c.hash",
            CommitRecord::QUALIFIED_COLUMNS
        ),
        [email.to_lowercase()],
    )
}

/// Commits of one conventional-commit type
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_commits_by_type(
    conn: &Connection,
    kind: &str,
) -> Result<Vec<CommitRecord>, QueryError> {
    collect_commits(
        conn,
        &format!(
            "SELECT {} FROM commits WHERE type = ?1 ORDER BY date DESC, hash",
            CommitRecord::COLUMNS
        ),
        [kind.to_lowercase()],
    )
}

/// Commits of one conventional-commit scope
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_commits_by_scope(
    conn: &Connection,
    scope: &str,
) -> Result<Vec<CommitRecord>, QueryError> {
    collect_commits(
        conn,
        &format!(
            "SELECT {} FROM commits WHERE scope = ?1 ORDER BY date DESC, hash",
            CommitRecord::COLUMNS
        ),
        [scope.to_lowercase()],
    )
}

/// Distinct commits touching a path starting with `prefix`
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_commits_by_path(
    conn: &Connection,
    prefix: &str,
) -> Result<Vec<CommitRecord>, QueryError> {
    let pattern = format!("{}%", escape_like(prefix));
    collect_commits(
        conn,
        &format!(
            "SELECT DISTINCT {} FROM commits c
             JOIN commit_files f ON f.hash = c.hash
             WHERE f.path LIKE ?1 ESCAPE '\\'
             ORDER BY c.date DESC, c.hash",
            CommitRecord::QUALIFIED_COLUMNS
        ),
        [pattern],
    )
}

/// Commits touching files inside a package directory
///
/// A trailing `/` is added so `packages/foo` does not match `packages/foobar`.
///
/// # Errors
///
/// Returns an error if the path is empty or the query fails.
pub fn find_commits_by_package(
    conn: &Connection,
    package_path: &str,
) -> Result<Vec<CommitRecord>, QueryError> {
    find_commits_by_path(conn, &package_prefix(package_path)?)
}

pub(crate) fn package_prefix(package_path: &str) -> Result<String, QueryError> {
    if package_path.is_empty() {
        return Err(QueryError::InvalidParameter(
            "Package path cannot be empty".into(),
        ));
    }
    Ok(if package_path.ends_with('/') {
        package_path.to_string()
    } else {
        format!("{package_path}/")
    })
}

/// Files changed by one commit, ordered by path
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn commit_files(conn: &Connection, hash: &str) -> Result<Vec<CommitFileRecord>, QueryError> {
    let mut stmt =
        conn.prepare("SELECT hash, path, status FROM commit_files WHERE hash = ?1 ORDER BY path")?;
    let rows = stmt.query_map([hash], file_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

// ============================================================================
// Authors, files, meta
// ============================================================================

/// All authors ordered by email
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_authors(conn: &Connection) -> Result<Vec<AuthorRecord>, QueryError> {
    let mut stmt = conn.prepare("SELECT id, name, email FROM authors ORDER BY email")?;
    let rows = stmt.query_map([], author_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// Authors whose name or email contains `query`, ordered by email
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_authors(conn: &Connection, query: &str) -> Result<Vec<AuthorRecord>, QueryError> {
    let pattern = format!("%{}%", escape_like(query));
    let mut stmt = conn.prepare(
        "SELECT id, name, email FROM authors
         WHERE name LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\'
         ORDER BY email",
    )?;
    let rows = stmt.query_map([pattern], author_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// All file-change rows ordered by path
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_files(conn: &Connection, page: Page) -> Result<Vec<CommitFileRecord>, QueryError> {
    let mut stmt = conn.prepare(
        "SELECT hash, path, status FROM commit_files ORDER BY path, hash LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![page.sql_limit(), page.sql_offset()], file_from_row)?;
    Ok(rows.collect::<Result<_, _>>()?)
}

/// All meta rows ordered by key
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_meta(conn: &Connection) -> Result<Vec<MetaEntry>, QueryError> {
    let mut stmt = conn.prepare("SELECT key, value FROM meta ORDER BY key")?;
    let rows = stmt.query_map([], |row| {
        Ok(MetaEntry {
            key: row.get(0)?,
            value: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<_, _>>()?)
}
