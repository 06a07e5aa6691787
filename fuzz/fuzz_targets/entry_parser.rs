#![no_main]

use libfuzzer_sys::fuzz_target;
use logmerge::parse_entry;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Rejections are fine; a parsed entry must keep the message verbatim
        if let Ok(entry) = parse_entry(input) {
            let line = input.strip_suffix('\n').unwrap_or(input);
            let line = line.strip_suffix('\r').unwrap_or(line);
            assert!(line.ends_with(entry.message()));
        }
    }
});
