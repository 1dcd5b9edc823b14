// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Conventional-commit subject parsing
//!
//! Recognises subjects of the form `type(scope)!: description`. The scope and
//! the `!` breaking marker are optional. Anything else is "not conventional"
//! and yields all-`None` fields, which is distinct from a conventional commit
//! that is simply not breaking.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CONVENTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9-]*)(?:\(([^()\r\n]+)\))?(!)?: ")
        .expect("conventional commit pattern is valid")
});

/// Fields derived from a commit subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionalCommit {
    /// Commit type (`feat`, `fix`, ...), lower-cased
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Scope inside the parentheses, lower-cased
    pub scope: Option<String>,
    /// `Some(true)` when marked with `!`, `None` when not conventional
    pub is_breaking_change: Option<bool>,
}

impl ConventionalCommit {
    /// Parse a commit subject. Never fails.
    #[must_use]
    pub fn parse(message: &str) -> Self {
        let Some(caps) = CONVENTIONAL_RE.captures(message) else {
            return Self::default();
        };

        Self {
            kind: caps.get(1).map(|m| m.as_str().to_lowercase()),
            scope: caps.get(2).map(|m| m.as_str().to_lowercase()),
            is_breaking_change: Some(caps.get(3).is_some()),
        }
    }

    /// Whether the subject followed the convention at all
    #[must_use]
    pub fn is_conventional(&self) -> bool {
        self.kind.is_some()
    }
}
