//! Attribute dictionary codec.
//!
//! Wire format of a response dictionary:
//! ```text
//! ┌────────┬────────────┬──────────────────┬────────┬─────
//! │ id (1B)│ len (2B LE)│ value (len bytes)│ id (1B)│ ...
//! └────────┴────────────┴──────────────────┴────────┴─────
//! ```
//!
//! There is no terminator and no total length.  Completeness is inferred
//! from the schema: every mandatory attribute must have been seen and the
//! last attribute must be fully present.  The notification request asks
//! for the fixed-length date last, so a complete date marks the end.
//!
//! Decoding never allocates; every value is a borrowed span of the input.

use crate::error::CodecError;

use super::{AppAttributeId, NotificationAttributeId};

/// Size of the `{id, len}` prefix in front of every value.
pub const ATTRIBUTE_HEADER_LEN: usize = 3;

/// Upper bound on schema size; sizes the decoded slot array.
pub const MAX_SCHEMA_LEN: usize = 8;

pub const TITLE_MAX_LEN: u16 = 40;
pub const SUBTITLE_MAX_LEN: u16 = 40;
pub const MESSAGE_MAX_LEN: u16 = 200;
/// `yyyyMMdd'T'HHmmSS`
pub const DATE_LEN: u16 = 15;

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// One expected attribute in a response dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaEntry {
    pub id: u8,
    /// 0 = unbounded.
    pub max_length: u16,
    /// May be absent from a complete dictionary.
    pub optional: bool,
}

const fn entry(id: u8, max_length: u16, optional: bool) -> SchemaEntry {
    SchemaEntry {
        id,
        max_length,
        optional,
    }
}

/// Notification attributes, in request order.  Action labels are only
/// requested from iOS 9+ peers; message size is never requested but some
/// peers volunteer it.
pub const NOTIFICATION_SCHEMA: [SchemaEntry; 8] = [
    entry(NotificationAttributeId::PositiveActionLabel as u8, 0, true),
    entry(NotificationAttributeId::NegativeActionLabel as u8, 0, true),
    entry(NotificationAttributeId::AppIdentifier as u8, 0, false),
    entry(NotificationAttributeId::Title as u8, TITLE_MAX_LEN, false),
    entry(NotificationAttributeId::Subtitle as u8, SUBTITLE_MAX_LEN, false),
    entry(NotificationAttributeId::Message as u8, MESSAGE_MAX_LEN, false),
    entry(NotificationAttributeId::MessageSize as u8, 0, true),
    entry(NotificationAttributeId::Date as u8, DATE_LEN, false),
];

pub const APP_SCHEMA: [SchemaEntry; 1] = [entry(AppAttributeId::DisplayName as u8, 0, false)];

// ---------------------------------------------------------------------------
// Decoded output
// ---------------------------------------------------------------------------

/// One attribute as found in the input.  `value` holds only the bytes
/// actually present; it is shorter than `length` while a fragment is
/// still missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedAttribute<'a> {
    pub id: u8,
    pub length: u16,
    pub value: &'a [u8],
}

impl DecodedAttribute<'_> {
    pub fn is_complete(&self) -> bool {
        self.value.len() == usize::from(self.length)
    }
}

/// Result of decoding a dictionary against a schema.
#[derive(Debug, Clone)]
pub struct Dictionary<'a> {
    schema: &'static [SchemaEntry],
    slots: [Option<DecodedAttribute<'a>>; MAX_SCHEMA_LEN],
    complete: bool,
}

impl<'a> Dictionary<'a> {
    /// All mandatory attributes present and the last one fully received.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn get(&self, id: u8) -> Option<&DecodedAttribute<'a>> {
        let idx = self.schema.iter().position(|e| e.id == id)?;
        self.slots[idx].as_ref()
    }

    /// The value bytes of `id`, if present.
    pub fn value(&self, id: u8) -> Option<&'a [u8]> {
        self.get(id).map(|a| a.value)
    }

    /// Present attributes in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &DecodedAttribute<'a>> {
        self.slots[..self.schema.len()].iter().flatten()
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode `data` against `schema`.
///
/// Returns `Err` only for input that can never become valid by appending
/// more bytes: an id outside the schema or a length above the schema
/// maximum.  Truncated input decodes to an incomplete dictionary.
pub fn decode<'a>(
    data: &'a [u8],
    schema: &'static [SchemaEntry],
) -> Result<Dictionary<'a>, CodecError> {
    debug_assert!(schema.len() <= MAX_SCHEMA_LEN);

    let mut slots = [None; MAX_SCHEMA_LEN];
    let mut last_full = true;
    let mut pos = 0;

    while pos < data.len() {
        let id = data[pos];
        let idx = schema
            .iter()
            .position(|e| e.id == id)
            .ok_or(CodecError::UnknownAttribute(id))?;

        let Some(len_bytes) = data.get(pos + 1..pos + ATTRIBUTE_HEADER_LEN) else {
            // Id seen, length not yet.
            last_full = false;
            break;
        };
        let length = u16::from_le_bytes([len_bytes[0], len_bytes[1]]);

        let max = schema[idx].max_length;
        if max > 0 && length > max {
            return Err(CodecError::AttributeTooLong { id, length });
        }

        let start = pos + ATTRIBUTE_HEADER_LEN;
        let end = start + usize::from(length);
        let available = end.min(data.len());

        slots[idx] = Some(DecodedAttribute {
            id,
            length,
            value: &data[start..available],
        });
        last_full = available == end;
        pos = end;
    }

    let mandatory_seen = schema
        .iter()
        .zip(slots.iter())
        .all(|(e, slot)| e.optional || slot.is_some());

    Ok(Dictionary {
        schema,
        slots,
        complete: mandatory_seen && last_full,
    })
}

/// Append one `{id, len, value}` triple.  Used by tests and the replay tool
/// to synthesise peer responses.
pub fn encode_attribute(out: &mut Vec<u8>, id: u8, value: &[u8]) {
    out.push(id);
    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    out.extend_from_slice(value);
}
