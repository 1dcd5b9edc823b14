#![no_main]

//! Fuzz target for path and package queries
//!
//! Path prefixes are user input; no value may panic or break out of the
//! LIKE pattern.

use libfuzzer_sys::fuzz_target;

use gitdb::db::Database;
use gitdb::queries;

fuzz_target!(|prefix: String| {
    let mut db = Database::in_memory().expect("create db");
    db.migrate().expect("migrate db");

    let _ = queries::find_commits_by_path(db.connection(), &prefix);
    let _ = queries::find_commits_by_package(db.connection(), &prefix);
    let _ = queries::find_authors(db.connection(), &prefix);
});
