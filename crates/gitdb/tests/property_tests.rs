// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Property-based tests for git-db
//!
//! These tests use proptest to verify invariants hold for arbitrary inputs.


use proptest::prelude::*;

use fixtures::test_database;
use gitdb::db::{AuthorRecord, CommitBatch, CommitRecord, Database};
use gitdb::queries;

// ============================================================================
// Strategies
// ============================================================================

/// Messages built from digits, spaces and LIKE wildcards, so case folding
/// never matters
fn like_heavy_message() -> impl Strategy<Value = String> {
    "[0-9%_\\\\ ]{1,12}"
}

/// Day-of-month offsets for a handful of commits
fn days() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..28, 1..8)
}

fn commit(n: usize, day: u32, message: &str) -> CommitRecord {
    CommitRecord {
        hash: format!("{n:040x}"),
        author_id: "dev@example.com".to_string(),
        date: format!("2026-02-{day:02}T00:00:00+00:00"),
        message: message.to_string(),
        body: String::new(),
        refs: None,
        kind: None,
        scope: None,
        is_breaking_change: None,
    }
}

fn database_with(commits: Vec<CommitRecord>) -> Database {
    let mut db = test_database();
    db.index_commit_batch(&CommitBatch {
        authors: vec![AuthorRecord::new("Dev", "dev@example.com")],
        commits,
        files: Vec::new(),
    })
    .expect("index");
    db
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Swapping the endpoints never changes the result
    #[test]
    fn prop_between_is_order_independent(days in days(), a in 0usize..8, b in 0usize..8) {
        let n = days.len();
        let (a, b) = (a % n, b % n);
        let db = database_with(
            days.iter().enumerate().map(|(i, d)| commit(i, *d, "msg")).collect(),
        );
        let conn = db.connection();
        let ha = format!("{a:040x}");
        let hb = format!("{b:040x}");

        let forward = queries::find_commits_between(conn, &ha, &hb).expect("between");
        let backward = queries::find_commits_between(conn, &hb, &ha).expect("between");
        prop_assert_eq!(&forward, &backward);
        prop_assert!(forward.iter().any(|c| c.hash == ha));
        prop_assert!(forward.iter().any(|c| c.hash == hb));
    }

    /// An unknown endpoint always yields nothing
    #[test]
    fn prop_unknown_range_is_empty(days in days(), unknown in "[g-z]{1,40}") {
        let db = database_with(
            days.iter().enumerate().map(|(i, d)| commit(i, *d, "msg")).collect(),
        );
        let conn = db.connection();
        let known = format!("{:040x}", 0);

        prop_assert!(queries::find_commits_between(conn, &unknown, &known).expect("q").is_empty());
        prop_assert!(queries::find_commits_between(conn, &known, &unknown).expect("q").is_empty());
    }

    /// Message search treats `%`, `_` and `\` literally
    #[test]
    fn prop_message_search_is_literal(
        messages in prop::collection::vec(like_heavy_message(), 1..6),
        pick in 0usize..6,
        start in 0usize..12,
        len in 1usize..12,
    ) {
        let target = &messages[pick % messages.len()];
        let start = start % target.len();
        let end = (start + len).min(target.len());
        let needle = &target[start..end];

        let db = database_with(
            messages.iter().enumerate().map(|(i, m)| commit(i, 1, m)).collect(),
        );
        let found = queries::find_commits_by_message(db.connection(), needle).expect("q");

        prop_assert!(found.iter().any(|c| &c.message == target));
        for c in &found {
            prop_assert!(c.message.contains(needle), "{:?} does not contain {:?}", c.message, needle);
        }
    }

    /// Escaping only ever adds backslashes before the three special characters
    #[test]
    fn prop_escape_like_roundtrip(input in ".{0,40}") {
        let escaped = queries::escape_like(&input);
        let mut unescaped = String::new();
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                let next = chars.next();
                prop_assert!(matches!(next, Some('\\' | '%' | '_')));
                unescaped.extend(next);
            } else {
                prop_assert!(c != '%' && c != '_');
                unescaped.push(c);
            }
        }
        prop_assert_eq!(unescaped, input);
    }
}
