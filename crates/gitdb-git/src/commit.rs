//! Commit and file-change records read from git

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A commit as reported by `git log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    /// Full commit hash
    pub hash: String,
    /// Author name
    pub author_name: String,
    /// Author email, lower-cased
    pub author_email: String,
    /// Author date, ISO-8601 strict
    pub date: String,
    /// Subject line
    pub message: String,
    /// Message body (everything after the subject)
    pub body: String,
    /// Ref decoration (`HEAD -> main, tag: pkg@1.0.0`), if any
    pub refs: Option<String>,
}

impl GitCommit {
    /// Validate that a hash is a full 40-character hex string
    #[must_use]
    pub fn is_valid_hash(hash: &str) -> bool {
        hash.len() == 40 && hash.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get the short hash (first 7 characters)
    #[must_use]
    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }

    /// Parse the author date
    ///
    /// Returns `None` when the stored date is not RFC 3339.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date).ok()
    }

    /// Check whether the ref decoration mentions the given tag
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|t| t == tag)
    }

    /// Iterate over the tag names in the ref decoration
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.refs
            .as_deref()
            .unwrap_or("")
            .split(", ")
            .filter_map(|r| r.strip_prefix("tag: "))
    }
}

/// A path touched by a commit, from `git show --name-status`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Commit hash
    pub hash: String,
    /// Path relative to the repository root (the destination for renames)
    pub path: String,
    /// Status letter(s): `A`, `M`, `D`, `R100`, ...
    pub status: String,
}
