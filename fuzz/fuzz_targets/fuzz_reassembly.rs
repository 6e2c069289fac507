//! Fuzz target: `Reassembly` fed an arbitrary fragment sequence.
//!
//! The first byte picks the fragment size; the rest is the stream.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - The buffer never grows past `MAX_RESPONSE_LEN`
//! - A rejected append leaves the length unchanged
//!
//! cargo fuzz run fuzz_reassembly

#![no_main]

use ancs::reassembly::{MAX_RESPONSE_LEN, Reassembly};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&size, stream)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(size).max(1);
    let mut chunks = stream.chunks(chunk);

    let mut r = Reassembly::new();
    let Some(first) = chunks.next() else {
        return;
    };
    if r.start(first).is_err() {
        assert!(!r.is_active());
        return;
    }

    loop {
        if !matches!(r.poll(), Ok(None)) {
            break;
        }
        let Some(next) = chunks.next() else {
            break;
        };
        let before = r.len();
        if r.append(next).is_err() {
            assert_eq!(r.len(), before);
            break;
        }
        assert!(r.len() <= MAX_RESPONSE_LEN);
    }
    r.clear();
    assert!(r.is_empty());
});
