// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! `git log` / `git show` output formats and their parsers
//!
//! Log records use ASCII control characters as separators so subjects and
//! bodies containing newlines or tabs survive intact: a unit separator
//! (`0x1f`) between fields and a record separator (`0x1e`) after each commit.

use chrono::{DateTime, Utc};

use crate::commit::{ChangedFile, GitCommit};

/// Separator between fields of one log record
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// Separator after each log record
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// `--pretty` format matching [`parse_log_output`]
///
/// Fields: hash, author name, author email, author date, subject, body, refs.
pub const LOG_FORMAT: &str = "--pretty=format:%H%x1f%an%x1f%ae%x1f%ad%x1f%s%x1f%b%x1f%D%x1e";

/// Options for reading commits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Only read commits reachable from HEAD but not from this hash
    pub since_hash: Option<String>,
    /// Include merge commits (excluded by default)
    pub include_merges: bool,
    /// Maximum number of commits to read
    pub limit: Option<usize>,
    /// Number of commits to skip before reading
    pub skip: Option<usize>,
    /// Only include commits after this date
    pub since_date: Option<DateTime<Utc>>,
    /// Only include commits before this date
    pub until_date: Option<DateTime<Utc>>,
}

impl LogOptions {
    /// Create options for reading the N most recent commits
    #[must_use]
    pub fn latest(n: usize) -> Self {
        Self {
            limit: Some(n),
            ..Default::default()
        }
    }

    /// Only read commits newer than `hash`
    #[must_use]
    pub fn since_hash(mut self, hash: impl Into<String>) -> Self {
        self.since_hash = Some(hash.into());
        self
    }

    /// Include merge commits
    #[must_use]
    pub fn with_merges(mut self) -> Self {
        self.include_merges = true;
        self
    }

    /// Skip the first N commits
    #[must_use]
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = Some(n);
        self
    }

    /// Filter commits since a date
    #[must_use]
    pub fn since(mut self, date: DateTime<Utc>) -> Self {
        self.since_date = Some(date);
        self
    }

    /// Filter commits until a date
    #[must_use]
    pub fn until(mut self, date: DateTime<Utc>) -> Self {
        self.until_date = Some(date);
        self
    }

    /// Build the argument list for `git log`
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            LOG_FORMAT.to_string(),
            "--date=iso-strict".to_string(),
        ];

        if let Some(ref since) = self.since_hash {
            args.push(format!("{since}..HEAD"));
        }
        if !self.include_merges {
            args.push("--no-merges".to_string());
        }
        if let Some(limit) = self.limit {
            args.push(format!("--max-count={limit}"));
        }
        if let Some(skip) = self.skip {
            args.push(format!("--skip={skip}"));
        }
        if let Some(since) = self.since_date {
            args.push(format!("--since={}", since.to_rfc3339()));
        }
        if let Some(until) = self.until_date {
            args.push(format!("--until={}", until.to_rfc3339()));
        }

        args
    }
}

/// Parse output produced with [`LOG_FORMAT`]
///
/// Missing trailing fields become empty strings; an empty ref decoration
/// becomes `None`. Records without a hash are dropped. Dates are normalised
/// to UTC (`+00:00`) so that stored values sort chronologically.
#[must_use]
pub fn parse_log_output(output: &str) -> Vec<GitCommit> {
    output
        .split(RECORD_SEPARATOR)
        .filter_map(parse_log_record)
        .collect()
}

fn parse_log_record(record: &str) -> Option<GitCommit> {
    // git puts a newline between records
    let record = record.trim_start_matches(['\n', '\r']);
    if record.trim().is_empty() {
        return None;
    }

    let mut fields = record.split(FIELD_SEPARATOR);
    let mut next = || fields.next().unwrap_or("");

    let hash = next().trim().to_string();
    if hash.is_empty() {
        return None;
    }
    let author_name = next().to_string();
    let author_email = next().trim().to_lowercase();
    let date = normalize_date(next().trim());
    let message = next().to_string();
    let body = next().trim_end().to_string();
    let refs = next().trim();

    Some(GitCommit {
        hash,
        author_name,
        author_email,
        date,
        message,
        body,
        refs: (!refs.is_empty()).then(|| refs.to_string()),
    })
}

/// Render an ISO-8601 date in UTC, leaving unparseable input untouched
#[must_use]
pub fn normalize_date(date: &str) -> String {
    DateTime::parse_from_rfc3339(date)
        .map(|d| d.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|_| date.to_string())
}

/// Parse `git show --name-status --pretty=format:` output for one commit
///
/// Each line is `STATUS<TAB>PATH`, or `STATUS<TAB>OLD<TAB>NEW` for renames
/// and copies, in which case the destination path is kept.
#[must_use]
pub fn parse_name_status(hash: &str, output: &str) -> Vec<ChangedFile> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let status = parts.next()?.trim();
            let path = parts.last()?;
            if status.is_empty() || path.is_empty() {
                return None;
            }
            Some(ChangedFile {
                hash: hash.to_string(),
                path: path.to_string(),
                status: status.to_string(),
            })
        })
        .collect()
}

/// Split newline-separated command output into trimmed, non-empty lines
#[must_use]
pub fn parse_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
