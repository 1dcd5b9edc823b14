#![no_main]

use gitdb_git::ConventionalCommit;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let parsed = ConventionalCommit::parse(s);
        assert_eq!(parsed.kind.is_some(), parsed.is_breaking_change.is_some());
    }
});
