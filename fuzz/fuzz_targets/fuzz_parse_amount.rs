#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must not panic, whatever the operator's spreadsheet contains.
        if let Some(d) = kassenexport::core::parse_amount(s) {
            let _ = kassenexport::core::format_signed_amount(d);
        }
    }
});
