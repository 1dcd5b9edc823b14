// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! git-db library
//!
//! Incremental indexing of a repository's commit history into SQLite, plus
//! the read-only queries changelog and changeset builders run against it.
//!
//! - [`db`]: connection, schema and the transactional batch write
//! - [`state`]: the `last_indexed_*` bookmark
//! - [`scanner`]: one incremental scan
//! - [`queries`]: read accessors
//! - [`scope`]: tag and range helpers that combine git and the store

mod migrations;

pub mod commands;
pub mod config;
pub mod db;
pub mod queries;
pub mod scanner;
pub mod scope;
pub mod state;

pub use migrations::{CURRENT_VERSION, MigrationError};
