#![no_main]

use gitdb_git::log::{parse_log_output, parse_name_status};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for commit in parse_log_output(s) {
            assert!(!commit.hash.is_empty());
        }
        let _ = parse_name_status("fuzz", s);
    }
});
