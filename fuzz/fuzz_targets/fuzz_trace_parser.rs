//! Fuzz target: replay trace parser.
//!
//! Invariants checked:
//! - No panics on any UTF-8 input
//! - Error line numbers point inside the input
//!
//! cargo fuzz run fuzz_trace_parser

#![no_main]

use ancs::adapters::trace::parse_trace;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Err(e) = parse_trace(text) {
        assert!(e.line >= 1 && e.line <= text.lines().count());
    }
});
