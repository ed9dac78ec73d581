#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let table: Vec<Vec<String>> = s
            .lines()
            .map(|l| l.split('\t').map(str::to_string).collect())
            .collect();
        let _ = kassenexport::source::report_rows(Path::new("fuzz.pdf"), &table, &[]);
    }
});
