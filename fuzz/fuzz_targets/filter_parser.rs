#![no_main]

use assay::filter::RowFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing must never panic, whatever the expression
        let _ = RowFilter::from_expr(input);
    }
});
