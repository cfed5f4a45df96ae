#![no_main]

use checkpub_domain::Format;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // The parser should never panic, regardless of input
        let _ = Format::parse(text);
    }
});
