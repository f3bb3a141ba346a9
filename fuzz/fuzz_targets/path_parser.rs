//! Fuzz target for dotted path parsing.
//!
//! This target feeds arbitrary byte sequences to the path parser to find
//! crashes, panics, and round-trip breakage.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_path_parser
//! ```

#![no_main]

use espalier_resolve::path::Path;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string, ignoring invalid UTF-8
    if let Ok(input) = std::str::from_utf8(data) {
        // The parser should never panic, only return errors
        if let Ok(path) = input.parse::<Path>() {
            // A parsed path renders to a string that parses back to itself:
            // indices are normalized and segments are never empty.
            let rendered = path.to_string();
            let reparsed: Path = rendered.parse().expect("rendered path must reparse");
            assert_eq!(reparsed, path);
        }
    }
});
