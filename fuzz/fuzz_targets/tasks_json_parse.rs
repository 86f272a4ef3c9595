//! Fuzz target for task-export JSON parsing.
//!
//! Feeds arbitrary bytes through the raw-record decoder and part resolution,
//! checking for panics, crashes, or hangs.

#![no_main]

use annotation_exporter::annotations::fuzz_parse_tasks;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse_tasks(data);
});
