//! Fuzz target: attribute dictionary decoder and response parser.
//!
//! Feeds arbitrary bytes to `parse_response` and to `codec::decode` with
//! both schemas.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Every decoded value lies inside the input and never exceeds the
//!   declared length
//! - A complete dictionary contains every mandatory schema entry
//!
//! cargo fuzz run fuzz_attribute_codec

#![no_main]

use ancs::protocol::codec::{self, APP_SCHEMA, NOTIFICATION_SCHEMA, SchemaEntry};
use ancs::protocol::parsers::parse_response;
use libfuzzer_sys::fuzz_target;

fn check(data: &[u8], schema: &'static [SchemaEntry]) {
    let Ok(dict) = codec::decode(data, schema) else {
        return;
    };
    for attr in dict.iter() {
        assert!(attr.value.len() <= usize::from(attr.length));
        assert!(attr.value.len() <= data.len());
    }
    if dict.is_complete() {
        for entry in schema.iter().filter(|e| !e.optional) {
            assert!(dict.get(entry.id).is_some(), "mandatory id {} missing", entry.id);
        }
    }
}

fuzz_target!(|data: &[u8]| {
    check(data, &NOTIFICATION_SCHEMA);
    check(data, &APP_SCHEMA);
    let _ = parse_response(data);
});
