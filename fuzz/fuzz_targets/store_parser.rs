#![no_main]

use assay::store::OutlierStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(store) = OutlierStore::from_json_str(input) {
            // Anything accepted must render and parse back to the same store
            let rendered = store.to_json_string().unwrap();
            assert_eq!(OutlierStore::from_json_str(&rendered).unwrap(), store);
        }
    }
});
