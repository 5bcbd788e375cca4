//! Fuzz target for the notation parser entry points
//!
//! Feeds arbitrary byte strings to each parser to find crashes or panics.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Diminishing returns past this length
        if input.len() > 1000 {
            return;
        }

        let _ = ferro_kb::parse(input);
        let _ = ferro_kb::parse_multi_feature(input);
        let _ = ferro_kb::parse_histone(input);

        if let Some(prefix) = input.chars().next() {
            let _ = ferro_kb::notation::parse_position(prefix, &input[prefix.len_utf8()..]);
        }
    }
});
