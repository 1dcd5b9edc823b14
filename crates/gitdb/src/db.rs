// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Database module for git-db
//!
//! This module owns the SQLite connection, the row types for the four
//! tables (`authors`, `commits`, `commit_files`, `meta`) and the single
//! transactional write path used by the scanner.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::migrations;

/// Tables that may be passed to [`Database::count`]
const TABLES: &[&str] = &["authors", "commits", "commit_files", "meta"];

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] migrations::MigrationError),

    /// Table name not part of the schema
    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

// ============================================================================
// Records
// ============================================================================

/// An author, keyed by lower-cased email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    /// Primary key, equal to `email`
    pub id: String,
    /// Display name
    pub name: String,
    /// Lower-cased email
    pub email: String,
}

impl AuthorRecord {
    /// Create an author; the id is the lower-cased email
    #[must_use]
    pub fn new(name: impl Into<String>, email: &str) -> Self {
        let email = email.to_lowercase();
        Self {
            id: email.clone(),
            name: name.into(),
            email,
        }
    }
}

/// A commit row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash
    pub hash: String,
    /// References `authors.id`
    pub author_id: String,
    /// Author date, ISO 8601
    pub date: String,
    /// Subject line
    pub message: String,
    /// Message body
    pub body: String,
    /// Raw ref decoration
    pub refs: Option<String>,
    /// Conventional-commit type
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Conventional-commit scope
    pub scope: Option<String>,
    /// `None` when the subject is not a conventional commit
    pub is_breaking_change: Option<bool>,
}

impl CommitRecord {
    /// Columns in the order [`CommitRecord::from_row`] expects
    pub(crate) const COLUMNS: &'static str =
        "hash, author_id, date, message, body, refs, type, scope, is_breaking_change";

    /// Same columns qualified with the `c.` alias
    pub(crate) const QUALIFIED_COLUMNS: &'static str = "c.hash, c.author_id, c.date, c.message, \
         c.body, c.refs, c.type, c.scope, c.is_breaking_change";

    /// Map a row selected with [`CommitRecord::COLUMNS`]
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            hash: row.get(0)?,
            author_id: row.get(1)?,
            date: row.get(2)?,
            message: row.get(3)?,
            body: row.get(4)?,
            refs: row.get(5)?,
            kind: row.get(6)?,
            scope: row.get(7)?,
            is_breaking_change: row.get(8)?,
        })
    }
}

/// A path touched by a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFileRecord {
    /// References `commits.hash`
    pub hash: String,
    /// File path
    pub path: String,
    /// Single-letter status, possibly with a similarity score (`R100`)
    pub status: String,
}

/// A key/value row of the `meta` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    /// Unique key
    pub key: String,
    /// Stored value
    pub value: String,
}

/// Rows produced by one scan, written in a single transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitBatch {
    /// Authors, deduplicated by id
    pub authors: Vec<AuthorRecord>,
    /// Commits
    pub commits: Vec<CommitRecord>,
    /// File changes for the batch's commits
    pub files: Vec<CommitFileRecord>,
}

impl CommitBatch {
    /// Whether the batch has no commits
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Rows processed by [`Database::index_commit_batch`]
///
/// These are input sizes, not insert counts: duplicates are ignored silently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    /// Authors processed
    pub authors: usize,
    /// Commits processed
    pub commits: usize,
    /// File rows written
    pub files: usize,
}

// ============================================================================
// Database
// ============================================================================

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self, DbError> {
        Self::configure(Connection::open_in_memory()?)
    }

    /// Open a database file, creating it if needed
    ///
    /// The schema is not touched; call [`Database::migrate`] or use
    /// [`open_db`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        debug!(path = %path.display(), "Opening database");
        Self::configure(Connection::open(path)?)
    }

    fn configure(conn: Connection) -> Result<Self, DbError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    /// Create or upgrade the schema
    ///
    /// Safe to call repeatedly; returns the versions applied by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn migrate(&mut self) -> Result<Vec<i32>, DbError> {
        Ok(migrations::migrate(&mut self.conn)?)
    }

    /// Undo schema versions newer than `version`, newest first
    ///
    /// Rolling back to 0 drops every table, including the index state.
    /// Returns the versions reverted by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if a reverse migration fails.
    pub fn rollback_to(&mut self, version: i32) -> Result<Vec<i32>, DbError> {
        Ok(migrations::rollback_to(&mut self.conn, version)?)
    }

    /// Check if the database is initialized and up to date
    pub fn is_initialized(&self) -> bool {
        migrations::is_up_to_date(&self.conn)
    }

    /// Get the current schema version
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, DbError> {
        Ok(migrations::get_version(&self.conn)?)
    }

    /// Get the underlying connection (for queries)
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Close the connection, reporting any error SQLite raises
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite fails to close the handle.
    pub fn close(self) -> Result<(), DbError> {
        self.conn.close().map_err(|(_, e)| DbError::Sqlite(e))
    }

    /// Count rows in one of the schema's tables
    ///
    /// # Errors
    ///
    /// Returns an error if the table is unknown or the query fails.
    pub fn count(&self, table: &str) -> Result<i64, DbError> {
        if !TABLES.contains(&table) {
            return Err(DbError::UnknownTable(table.to_string()));
        }
        let query = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.conn.query_row(&query, [], |row| row.get(0))?;
        Ok(count)
    }

    // ========================================================================
    // Meta
    // ========================================================================

    /// Read a meta value
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    /// Insert or replace a meta value
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        upsert_meta(&self.conn, key, value)?;
        Ok(())
    }

    /// Remove a meta value; absent keys are not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn delete_meta(&self, key: &str) -> Result<(), DbError> {
        self.conn.execute("DELETE FROM meta WHERE key = ?1", [key])?;
        Ok(())
    }

    // ========================================================================
    // Batch writes
    // ========================================================================

    /// Write one scan's rows atomically
    ///
    /// Authors and commits are inserted only if absent. File rows for the
    /// batch's commits are deleted and rewritten, so re-indexing a commit
    /// never duplicates them. Any failure rolls back the whole batch.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; nothing is written in that case.
    pub fn index_commit_batch(&mut self, batch: &CommitBatch) -> Result<BatchCounts, DbError> {
        let tx = self.conn.transaction()?;

        {
            let mut insert_author = tx.prepare_cached(
                "INSERT INTO authors (id, name, email) VALUES (?1, ?2, ?3)
                 ON CONFLICT DO NOTHING",
            )?;
            for author in &batch.authors {
                insert_author.execute(params![author.id, author.name, author.email])?;
            }

            let mut insert_commit = tx.prepare_cached(
                "INSERT INTO commits
                    (hash, author_id, date, message, body, refs, type, scope, is_breaking_change)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(hash) DO NOTHING",
            )?;
            for c in &batch.commits {
                insert_commit.execute(params![
                    c.hash,
                    c.author_id,
                    c.date,
                    c.message,
                    c.body,
                    c.refs,
                    c.kind,
                    c.scope,
                    c.is_breaking_change,
                ])?;
            }

            let mut delete_files = tx.prepare_cached("DELETE FROM commit_files WHERE hash = ?1")?;
            for c in &batch.commits {
                delete_files.execute([&c.hash])?;
            }

            // a path can be listed twice for one commit (e.g. merges); keep the last
            let mut insert_file = tx.prepare_cached(
                "INSERT OR REPLACE INTO commit_files (hash, path, status) VALUES (?1, ?2, ?3)",
            )?;
            for f in &batch.files {
                insert_file.execute(params![f.hash, f.path, f.status])?;
            }
        }

        tx.commit()?;

        let counts = BatchCounts {
            authors: batch.authors.len(),
            commits: batch.commits.len(),
            files: batch.files.len(),
        };
        debug!(
            authors = counts.authors,
            commits = counts.commits,
            files = counts.files,
            "Indexed commit batch"
        );
        Ok(counts)
    }
}

/// Upsert a meta row on any connection or transaction
pub(crate) fn upsert_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
}

/// Open a database file and bring its schema up to date
///
/// # Errors
///
/// Returns an error if the file cannot be opened or migrated.
pub fn open_db(path: &Path) -> Result<Database, DbError> {
    let mut db = Database::open(path)?;
    db.migrate()?;
    Ok(db)
}

/// Close a database handle
///
/// # Errors
///
/// Returns an error if SQLite fails to close the handle.
pub fn close_db(db: Database) -> Result<(), DbError> {
    db.close()
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn test_db() -> Database {
        let mut db = Database::in_memory().expect("should create db");
        db.migrate().expect("should migrate");
        db
    }

    fn commit(hash: &str, author: &str, date: &str, message: &str) -> CommitRecord {
        CommitRecord {
            hash: hash.to_string(),
            author_id: author.to_string(),
            date: date.to_string(),
            message: message.to_string(),
            body: String::new(),
            refs: None,
            kind: None,
            scope: None,
            is_breaking_change: None,
        }
    }

    fn file(hash: &str, path: &str) -> CommitFileRecord {
        CommitFileRecord {
            hash: hash.to_string(),
            path: path.to_string(),
            status: "M".to_string(),
        }
    }

    fn sample_batch() -> CommitBatch {
        CommitBatch {
            authors: vec![AuthorRecord::new("Alice", "alice@example.com")],
            commits: vec![
                commit("h1", "alice@example.com", "2026-01-01T00:00:00+00:00", "one"),
                commit("h2", "alice@example.com", "2026-01-02T00:00:00+00:00", "two"),
            ],
            files: vec![file("h1", "a.rs"), file("h2", "b.rs"), file("h2", "c.rs")],
        }
    }

    #[test]
    fn test_database_in_memory() {
        let db = Database::in_memory().expect("should create in-memory db");
        assert!(!db.is_initialized());
    }

    #[test]
    fn test_database_migrate_idempotent() {
        let mut db = Database::in_memory().expect("should create db");
        assert_eq!(db.migrate().expect("first"), vec![1]);
        assert!(db.migrate().expect("second").is_empty());
        assert_eq!(db.schema_version().expect("version"), 1);
    }

    #[test]
    fn test_rollback_then_migrate_again() {
        let mut db = test_db();
        db.index_commit_batch(&sample_batch()).expect("index");

        assert_eq!(db.rollback_to(0).expect("rollback"), vec![1]);
        assert_eq!(db.schema_version().expect("version"), 0);
        assert!(!db.is_initialized());
        assert!(db.rollback_to(0).expect("second rollback").is_empty());

        assert_eq!(db.migrate().expect("migrate"), vec![1]);
        assert_eq!(db.count("commits").expect("count"), 0);
    }

    #[test]
    fn test_author_id_is_lowercased_email() {
        let author = AuthorRecord::new("Bob", "Bob@Example.COM");
        assert_eq!(author.id, "bob@example.com");
        assert_eq!(author.email, author.id);
    }

    #[test]
    fn test_database_indexes_created() {
        let db = test_db();

        let indexes = [
            "idx_authors_email",
            "idx_commits_date",
            "idx_commits_message",
            "idx_commits_type",
            "idx_commits_scope",
            "idx_commit_files_path",
            "idx_commit_files_hash",
        ];

        for index in indexes {
            let exists: i32 = db
                .connection()
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name=?",
                    [index],
                    |row| row.get(0),
                )
                .expect("query should succeed");
            assert_eq!(exists, 1, "Index {index} should exist");
        }
    }

    #[test]
    fn test_count_rejects_unknown_table() {
        let db = test_db();
        assert!(matches!(
            db.count("sqlite_master; DROP TABLE commits"),
            Err(DbError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_index_commit_batch() {
        let mut db = test_db();
        let counts = db.index_commit_batch(&sample_batch()).expect("index");

        assert_eq!(
            counts,
            BatchCounts {
                authors: 1,
                commits: 2,
                files: 3
            }
        );
        assert_eq!(db.count("authors").expect("count"), 1);
        assert_eq!(db.count("commits").expect("count"), 2);
        assert_eq!(db.count("commit_files").expect("count"), 3);
    }

    #[test]
    fn test_index_commit_batch_idempotent() {
        let mut db = test_db();
        db.index_commit_batch(&sample_batch()).expect("first");
        let counts = db.index_commit_batch(&sample_batch()).expect("second");

        // processed counts, not inserted counts
        assert_eq!(counts.commits, 2);
        assert_eq!(db.count("authors").expect("count"), 1);
        assert_eq!(db.count("commits").expect("count"), 2);
        assert_eq!(db.count("commit_files").expect("count"), 3);
    }

    #[test]
    fn test_file_rows_replaced_on_rescan() {
        let mut db = test_db();
        db.index_commit_batch(&sample_batch()).expect("first");

        let mut rescan = sample_batch();
        rescan.commits.truncate(1);
        rescan.files = vec![file("h1", "renamed.rs")];
        db.index_commit_batch(&rescan).expect("rescan");

        let paths: Vec<String> = db
            .connection()
            .prepare("SELECT path FROM commit_files WHERE hash = 'h1'")
            .expect("prepare")
            .query_map([], |row| row.get(0))
            .expect("query")
            .collect::<Result<_, _>>()
            .expect("rows");
        assert_eq!(paths, vec!["renamed.rs".to_string()]);
        assert_eq!(db.count("commit_files").expect("count"), 3);
    }

    #[test]
    fn test_existing_commit_not_overwritten() {
        let mut db = test_db();
        db.index_commit_batch(&sample_batch()).expect("first");

        let mut changed = sample_batch();
        changed.commits[0].message = "rewritten".to_string();
        db.index_commit_batch(&changed).expect("second");

        let message: String = db
            .connection()
            .query_row("SELECT message FROM commits WHERE hash = 'h1'", [], |r| {
                r.get(0)
            })
            .expect("query");
        assert_eq!(message, "one");
    }

    #[test]
    fn test_batch_rolls_back_on_failure() {
        let mut db = test_db();

        // commit references an author that is not in the batch
        let bad = CommitBatch {
            authors: vec![AuthorRecord::new("Alice", "alice@example.com")],
            commits: vec![
                commit("ok", "alice@example.com", "2026-01-01T00:00:00+00:00", "fine"),
                commit("bad", "ghost@example.com", "2026-01-02T00:00:00+00:00", "orphan"),
            ],
            files: vec![file("ok", "a.rs")],
        };

        assert!(db.index_commit_batch(&bad).is_err());
        assert_eq!(db.count("authors").expect("count"), 0);
        assert_eq!(db.count("commits").expect("count"), 0);
        assert_eq!(db.count("commit_files").expect("count"), 0);
    }

    #[test]
    fn test_author_delete_restricted() {
        let mut db = test_db();
        db.index_commit_batch(&sample_batch()).expect("index");

        let result = db
            .connection()
            .execute("DELETE FROM authors WHERE id = 'alice@example.com'", []);
        assert!(result.is_err(), "authors with commits cannot be deleted");
    }

    #[test]
    fn test_commit_delete_cascades_to_files() {
        let mut db = test_db();
        db.index_commit_batch(&sample_batch()).expect("index");

        db.connection()
            .execute("DELETE FROM commits WHERE hash = 'h2'", [])
            .expect("delete");
        assert_eq!(db.count("commit_files").expect("count"), 1);
    }

    #[test]
    fn test_meta_roundtrip() {
        let db = test_db();
        assert_eq!(db.get_meta("custom").expect("get"), None);

        db.set_meta("custom", "a").expect("set");
        db.set_meta("custom", "b").expect("upsert");
        assert_eq!(db.get_meta("custom").expect("get"), Some("b".to_string()));

        db.delete_meta("custom").expect("delete");
        db.delete_meta("custom").expect("delete absent");
        assert_eq!(db.get_meta("custom").expect("get"), None);
    }

    #[test]
    fn test_breaking_change_tristate_stored() {
        let mut db = test_db();
        let mut batch = sample_batch();
        batch.commits[0].is_breaking_change = Some(true);
        batch.commits[1].is_breaking_change = None;
        db.index_commit_batch(&batch).expect("index");

        let values: Vec<Option<bool>> = db
            .connection()
            .prepare("SELECT is_breaking_change FROM commits ORDER BY hash")
            .expect("prepare")
            .query_map([], |row| row.get(0))
            .expect("query")
            .collect::<Result<_, _>>()
            .expect("rows");
        assert_eq!(values, vec![Some(true), None]);
    }

    #[test]
    fn test_open_db_file_and_close() {
        let path = std::env::temp_dir().join(format!("gitdb-db-test-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let db = open_db(&path).expect("open");
        assert!(db.is_initialized());
        close_db(db).expect("close");

        let reopened = open_db(&path).expect("reopen");
        assert_eq!(reopened.schema_version().expect("version"), 1);
        reopened.close().expect("close");
        let _ = std::fs::remove_file(&path);
    }
}
