#![no_main]

//! Fuzz target for literal message search
//!
//! Arbitrary substrings must never panic, and every hit must contain the
//! needle literally (modulo ASCII case).

use libfuzzer_sys::fuzz_target;

use gitdb::db::{AuthorRecord, CommitBatch, CommitRecord, Database};
use gitdb::queries;

fn create_test_db(message: &str) -> Database {
    let mut db = Database::in_memory().expect("create db");
    db.migrate().expect("migrate db");
    db.index_commit_batch(&CommitBatch {
        authors: vec![AuthorRecord::new("Fuzz", "fuzz@example.com")],
        commits: vec![CommitRecord {
            hash: "0".repeat(40),
            author_id: "fuzz@example.com".to_string(),
            date: "2026-01-01T00:00:00+00:00".to_string(),
            message: message.to_string(),
            body: String::new(),
            refs: None,
            kind: None,
            scope: None,
            is_breaking_change: None,
        }],
        files: Vec::new(),
    })
    .expect("index");
    db
}

fuzz_target!(|input: (String, String)| {
    let (message, needle) = input;
    let db = create_test_db(&message);

    let found = queries::find_commits_by_message(db.connection(), &needle).expect("query");
    for commit in found {
        assert!(
            commit
                .message
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase())
        );
    }
});
