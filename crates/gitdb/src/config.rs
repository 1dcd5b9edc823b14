//! Configuration for the git-db command line
//!
//! This module provides the clap definitions for the `git-db` binary,
//! including the database and repository paths, logging options and the
//! scan and query subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::queries::Page;
use crate::scanner::{DEFAULT_FILE_CONCURRENCY, ScanOptions};

/// git-db - incremental git history index backed by SQLite
#[derive(Parser, Debug, Clone)]
#[command(name = "git-db")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (defaults to `scan`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// SQLite index file
    ///
    /// Created and migrated on first use. Defaults to
    /// `<data dir>/git-db/<repository name>.db`.
    #[arg(short, long, env = "GITDB_DATABASE")]
    pub database: Option<PathBuf>,

    /// Repository working directory
    ///
    /// Defaults to the current working directory.
    #[arg(short, long, env = "GITDB_REPO")]
    pub repo: Option<PathBuf>,

    /// git binary to run
    #[arg(long, env = "GITDB_GIT", default_value = "git")]
    pub git: String,

    /// Log at debug level
    ///
    /// Logs go to stderr so JSON output on stdout stays clean.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Maximum concurrent `git show` processes during a scan
    #[arg(long, env = "GITDB_FILE_CONCURRENCY", default_value_t = DEFAULT_FILE_CONCURRENCY)]
    pub file_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: None,
            database: None,
            repo: None,
            git: "git".to_string(),
            verbose: false,
            quiet: false,
            file_concurrency: DEFAULT_FILE_CONCURRENCY,
        }
    }
}

/// Top-level subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Index commits added since the last scan
    Scan {
        /// Start after this commit instead of the stored bookmark
        #[arg(long)]
        since: Option<String>,

        /// Read at most N commits
        #[arg(long)]
        limit: Option<usize>,

        /// Skip the first N commits
        #[arg(long)]
        skip: Option<usize>,

        /// Include merge commits
        #[arg(long)]
        include_merges: bool,
    },

    /// Show the index bookmark and schema version
    State,

    /// Query the index
    #[command(subcommand)]
    Query(Query),
}

/// Query subcommands; every result is printed as JSON
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// All commits, newest first
    Commits {
        /// Maximum rows
        #[arg(long)]
        limit: Option<usize>,
        /// Rows to skip
        #[arg(long)]
        offset: Option<usize>,
    },
    /// One commit and its files
    Commit {
        /// Full commit hash
        hash: String,
    },
    /// Commits whose subject contains a substring
    Message {
        /// Literal substring
        text: String,
    },
    /// Commits dated between two commits
    Between {
        /// First hash
        from: String,
        /// Second hash
        to: String,
    },
    /// Commits dated between two ISO-8601 dates
    Dates {
        /// Start date
        from: String,
        /// End date
        to: String,
    },
    /// Commits by author email
    Author {
        /// Email address
        email: String,
    },
    /// Commits of a conventional-commit type
    Type {
        /// Type such as `feat` or `fix`
        kind: String,
    },
    /// Commits of a conventional-commit scope
    Scope {
        /// Scope name
        scope: String,
    },
    /// Commits touching paths with a prefix
    Path {
        /// Path prefix
        prefix: String,
    },
    /// Commits touching files inside a package directory
    Package {
        /// Package directory
        path: String,
    },
    /// Authors, optionally filtered by name or email
    Authors {
        /// Substring to match
        query: Option<String>,
    },
    /// File-change rows ordered by path
    Files {
        /// Maximum rows
        #[arg(long)]
        limit: Option<usize>,
        /// Rows to skip
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Meta table contents
    Meta,
    /// Newest release tag for a scope
    LatestTag {
        /// Scope name
        scope: String,
    },
    /// Commits of a scope between two references, in git order
    ScopeRange {
        /// Scope name
        scope: String,
        /// Start reference (inclusive)
        from: String,
        /// End reference (inclusive)
        #[arg(default_value = "HEAD")]
        to: String,
    },
    /// Commits touching a path prefix between two references, in git order
    PathRange {
        /// Path prefix
        prefix: String,
        /// Start reference (inclusive)
        from: String,
        /// End reference (inclusive)
        #[arg(default_value = "HEAD")]
        to: String,
    },
    /// Commits of a scope since its latest release tag
    Unreleased {
        /// Scope name
        scope: String,
    },
}

impl Query {
    /// Pagination for the listing subcommands
    #[must_use]
    pub fn page(&self) -> Page {
        match self {
            Self::Commits { limit, offset } | Self::Files { limit, offset } => Page {
                limit: *limit,
                offset: *offset,
            },
            _ => Page::default(),
        }
    }
}

impl Config {
    /// Repository directory, falling back to the current directory
    ///
    /// Returns `None` if no repository is specified and the current
    /// directory cannot be determined.
    #[must_use]
    pub fn repo_path(&self) -> Option<PathBuf> {
        self.repo.clone().or_else(|| std::env::current_dir().ok())
    }

    /// Database file, falling back to a per-repository file in the data dir
    ///
    /// The default is named after the repository directory:
    /// - Linux: ~/.local/share/git-db/<repo>.db
    /// - macOS: ~/Library/Application Support/git-db/<repo>.db
    /// - Windows: %LOCALAPPDATA%\git-db\<repo>.db
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            let name = self
                .repo_path()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "repository".to_string());
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("git-db")
                .join(format!("{name}.db"))
        })
    }

    /// Scan options for the `scan` subcommand (or the default scan)
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default().with_file_concurrency(self.file_concurrency);
        if let Some(Command::Scan {
            since,
            limit,
            skip,
            include_merges,
        }) = &self.command
        {
            options.since_hash = since.clone();
            options.limit = *limit;
            options.skip = *skip;
            options.include_merges = *include_merges;
        }
        options
    }

    /// Check the repository path and prepare the database directory
    ///
    /// # Errors
    ///
    /// Returns an error if the repository path is missing or not a
    /// directory, or if the database's parent directory cannot be created.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref repo) = self.repo {
            if !repo.exists() {
                return Err(ConfigError::RepoNotFound(repo.clone()));
            }
            if !repo.is_dir() {
                return Err(ConfigError::RepoNotDirectory(repo.clone()));
            }
        }

        let db_path = self.database_path();
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::DatabaseDirectoryCreateFailed(parent.to_path_buf(), e))?;
        }

        Ok(())
    }

    /// Tracing level selected by `--verbose` / `--quiet`
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Repository path not found: {0}")]
    RepoNotFound(PathBuf),

    #[error("Repository path is not a directory: {0}")]
    RepoNotDirectory(PathBuf),

    #[error("Cannot create database directory {0}: {1}")]
    DatabaseDirectoryCreateFailed(PathBuf, std::io::Error),
}
