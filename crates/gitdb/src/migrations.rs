//! Database migrations for git-db
//!
//! Schema versions are recorded in the `meta` table under `schema_version`.
//! Each pending migration runs in its own transaction together with the
//! version stamp, so a failed migration leaves the previous version intact.

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored schema version is not a number
    #[error("Invalid schema version in meta table: {0}")]
    InvalidVersion(String),
}

/// Schema version this build writes
pub const CURRENT_VERSION: i32 = 1;

/// Meta key holding the schema version
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// One step of the schema history
pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    /// Forward SQL batch
    pub up: &'static str,
    /// Reverse SQL batch, if the step can be undone
    pub down: Option<&'static str>,
}

pub static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "authors_commits_files",
    up: include_str!("schema.sql"),
    down: Some(
        "DROP TABLE IF EXISTS commit_files;
         DROP TABLE IF EXISTS commits;
         DROP TABLE IF EXISTS authors;
         DROP TABLE IF EXISTS meta;",
    ),
}];

fn meta_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'meta')",
        [],
        |row| row.get(0),
    )
}

fn stamp(tx: &Transaction<'_>, version: i32) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![SCHEMA_VERSION_KEY, version.to_string()],
    )?;
    Ok(())
}

/// Read the stored schema version, 0 for a fresh database
///
/// # Errors
///
/// Returns an error if the query fails or the stored version is not numeric.
pub fn get_version(conn: &Connection) -> Result<i32, MigrationError> {
    if !meta_exists(conn)? {
        return Ok(0);
    }

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            [SCHEMA_VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    stored.map_or(Ok(0), |raw| {
        raw.trim()
            .parse()
            .map_err(|_| MigrationError::InvalidVersion(raw))
    })
}

/// Bring the schema up to [`CURRENT_VERSION`]
///
/// Returns the versions applied by this call; empty when nothing was pending.
///
/// # Errors
///
/// Returns an error if reading the version or any step fails. Steps applied
/// before the failing one stay committed.
pub fn migrate(conn: &mut Connection) -> Result<Vec<i32>, MigrationError> {
    let from = get_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > from).collect();
    if pending.is_empty() {
        debug!(version = from, "Schema already current");
        return Ok(Vec::new());
    }

    let mut applied = Vec::with_capacity(pending.len());
    for step in pending {
        let tx = conn.transaction()?;
        tx.execute_batch(step.up)?;
        stamp(&tx, step.version)?;
        tx.commit()?;

        info!(version = step.version, name = step.name, "Applied migration");
        applied.push(step.version);
    }
    Ok(applied)
}

/// Undo applied steps newer than `target`, newest first
///
/// Steps without a `down` batch are skipped.
///
/// # Errors
///
/// Returns an error if reading the version or any reverse batch fails.
pub fn rollback_to(conn: &mut Connection, target: i32) -> Result<Vec<i32>, MigrationError> {
    let from = get_version(conn)?;
    let mut reverted = Vec::new();

    for step in MIGRATIONS
        .iter()
        .rev()
        .filter(|m| m.version > target && m.version <= from)
    {
        let Some(down) = step.down else { continue };
        let tx = conn.transaction()?;
        tx.execute_batch(down)?;
        // the first step drops meta itself
        if target > 0 {
            stamp(&tx, step.version - 1)?;
        }
        tx.commit()?;

        info!(version = step.version, name = step.name, "Reverted migration");
        reverted.push(step.version);
    }
    Ok(reverted)
}

#[must_use]
pub fn is_up_to_date(conn: &Connection) -> bool {
    matches!(get_version(conn), Ok(v) if v >= CURRENT_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        Connection::open_in_memory().expect("open in-memory db")
    }

    fn has_table(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [name],
            |row| row.get(0),
        )
        .expect("sqlite_master")
    }

    #[test]
    fn test_fresh_database_is_version_zero() {
        let conn = fresh();
        assert_eq!(get_version(&conn).expect("version"), 0);
        assert!(!is_up_to_date(&conn));
    }

    #[test]
    fn test_migrate_reaches_current_version() {
        let mut conn = fresh();
        assert_eq!(migrate(&mut conn).expect("migrate"), vec![1]);
        assert_eq!(get_version(&conn).expect("version"), CURRENT_VERSION);
        assert!(is_up_to_date(&conn));

        for table in ["authors", "commits", "commit_files", "meta"] {
            assert!(has_table(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_second_migrate_is_noop() {
        let mut conn = fresh();
        migrate(&mut conn).expect("first");
        assert!(migrate(&mut conn).expect("second").is_empty());
        assert_eq!(get_version(&conn).expect("version"), CURRENT_VERSION);
    }

    #[test]
    fn test_non_numeric_version_is_rejected() {
        let mut conn = fresh();
        migrate(&mut conn).expect("migrate");
        conn.execute(
            "UPDATE meta SET value = 'one' WHERE key = 'schema_version'",
            [],
        )
        .expect("overwrite version");

        assert!(matches!(
            get_version(&conn),
            Err(MigrationError::InvalidVersion(v)) if v == "one"
        ));
        assert!(!is_up_to_date(&conn));
    }

    #[test]
    fn test_rollback_to_zero_drops_schema() {
        let mut conn = fresh();
        migrate(&mut conn).expect("migrate");

        assert_eq!(rollback_to(&mut conn, 0).expect("rollback"), vec![1]);
        assert!(!has_table(&conn, "commits"));
        assert!(!has_table(&conn, "meta"));
        assert_eq!(get_version(&conn).expect("version"), 0);

        assert_eq!(migrate(&mut conn).expect("re-migrate"), vec![1]);
    }
}
