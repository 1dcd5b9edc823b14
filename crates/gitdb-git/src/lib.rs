// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! gitdb-git: git history reading for git-db
//!
//! This library crate reads commits, changed files and tags from a
//! repository and classifies commit subjects as conventional commits.
//! All version-control access goes through the [`GitSource`] trait.

//! # Example
//!
//! ```no_run
//! use gitdb_git::{ConventionalCommit, GitCli, GitSource, LogOptions};
//!
//! # async fn run() -> Result<(), gitdb_git::GitError> {
//! let repo = GitCli::new(".");
//! for c in repo.read_commits(&LogOptions::latest(10)).await? {
//!     let cc = ConventionalCommit::parse(&c.message);
//!     println!("{} {:?} {}", c.short_hash(), cc.kind, c.message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod commit;
pub mod conventional;
pub mod error;
pub mod log;
pub mod memory;
pub mod source;

pub use cli::GitCli;
pub use commit::{ChangedFile, GitCommit};
pub use conventional::ConventionalCommit;
pub use error::GitError;
pub use log::LogOptions;
pub use memory::MemoryRepo;
pub use source::GitSource;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commit::{ChangedFile, GitCommit};
    pub use crate::conventional::ConventionalCommit;
    pub use crate::error::GitError;
    pub use crate::log::LogOptions;
    pub use crate::source::GitSource;
}
