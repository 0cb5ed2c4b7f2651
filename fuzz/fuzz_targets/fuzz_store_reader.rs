#![no_main]

use libfuzzer_sys::fuzz_target;
use specstack::store::{ReaderConfig, SpectrumStoreReader};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Damaged stores must be rejected with an error, never a panic
    for config in [ReaderConfig::with_buffer_size(64), ReaderConfig::unbuffered()] {
        let Ok(mut reader) = SpectrumStoreReader::new(Cursor::new(data), config) else {
            return;
        };

        for result in reader.spectra().take(100) {
            if result.is_err() {
                break;
            }
        }
    }
});
