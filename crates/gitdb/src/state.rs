// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Index state tracking
//!
//! The bookmark marking how far indexing has progressed lives in the `meta`
//! table. [`IndexState`] is a plain value: it is read once at the start of a
//! scan and a new value is written only after the batch commits.

use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbError, upsert_meta};
use crate::migrations::{self, SCHEMA_VERSION_KEY};

/// Meta key for the newest indexed commit hash
pub const LAST_INDEXED_HASH_KEY: &str = "last_indexed_hash";

/// Meta key for the newest indexed commit date
pub const LAST_INDEXED_DATE_KEY: &str = "last_indexed_date";

/// Persisted indexing bookmark
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexState {
    /// Newest commit written by the last successful scan
    pub last_indexed_hash: Option<String>,
    /// Date of that commit
    pub last_indexed_date: Option<String>,
    /// Schema version, 0 when never migrated
    pub schema_version: i32,
}

impl IndexState {
    /// A state pointing at a new newest commit, keeping the schema version
    #[must_use]
    pub fn advanced_to(&self, hash: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            last_indexed_hash: Some(hash.into()),
            last_indexed_date: Some(date.into()),
            schema_version: self.schema_version,
        }
    }

    /// Whether any scan has completed
    #[must_use]
    pub fn has_indexed(&self) -> bool {
        self.last_indexed_hash.is_some()
    }
}

impl Database {
    /// Read the index state
    ///
    /// Missing hash and date read as `None`; a missing version reads as 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the meta table cannot be read.
    pub fn index_state(&self) -> Result<IndexState, DbError> {
        Ok(IndexState {
            last_indexed_hash: self.get_meta(LAST_INDEXED_HASH_KEY)?,
            last_indexed_date: self.get_meta(LAST_INDEXED_DATE_KEY)?,
            schema_version: migrations::get_version(self.connection())?,
        })
    }

    /// Write the index state in one transaction
    ///
    /// `None` deletes the key, so an empty state reads back as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails; nothing is changed in that case.
    pub fn set_index_state(&mut self, state: &IndexState) -> Result<(), DbError> {
        let tx = self.connection_mut().transaction()?;

        for (key, value) in [
            (LAST_INDEXED_HASH_KEY, &state.last_indexed_hash),
            (LAST_INDEXED_DATE_KEY, &state.last_indexed_date),
        ] {
            match value {
                Some(v) => {
                    upsert_meta(&tx, key, v)?;
                }
                None => {
                    tx.execute("DELETE FROM meta WHERE key = ?1", [key])?;
                }
            }
        }
        upsert_meta(&tx, SCHEMA_VERSION_KEY, &state.schema_version.to_string())?;

        tx.commit()?;
        Ok(())
    }

    /// Read only the last indexed hash
    ///
    /// # Errors
    ///
    /// Returns an error if the meta table cannot be read.
    pub fn last_indexed_hash(&self) -> Result<Option<String>, DbError> {
        Ok(self
            .connection()
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![LAST_INDEXED_HASH_KEY],
                |row| row.get(0),
            )
            .optional()?)
    }
}
