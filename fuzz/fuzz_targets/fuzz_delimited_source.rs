#![no_main]

use std::path::Path;

use kassenexport::normalize::{CashInvoice, Normalizer};
use kassenexport::source::DelimitedSource;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must not panic: malformed files are errors, bad rows are diagnostics.
    let Ok(rows) = DelimitedSource::default().read_bytes(Path::new("fuzz.csv"), data) else {
        return;
    };
    let invoices = CashInvoice::new("EUR");
    for row in rows.flatten() {
        let _ = invoices.normalize(&row);
    }
});
