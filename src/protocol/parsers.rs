//! Bounds-checked decoders for inbound ANCS messages.
//!
//! Every decoder reads field by field from a byte slice; nothing relies on
//! struct layout matching the wire.

use crate::error::CodecError;

use super::codec::{self, APP_SCHEMA, Dictionary, NOTIFICATION_SCHEMA};
use super::{
    AppAttributeId, CategoryId, CommandId, EventFlags, EventId, NOTIFICATION_SOURCE_LEN,
    NotificationAttributeId, NotificationUid,
};

// ---------------------------------------------------------------------------
// Notification Source
// ---------------------------------------------------------------------------

/// One Notification Source event:
/// `{event_id, event_flags, category_id, category_count, uid:u32 LE}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationSourceEvent {
    pub event_id: EventId,
    pub flags: EventFlags,
    pub category: CategoryId,
    pub category_count: u8,
    pub uid: NotificationUid,
}

impl NotificationSourceEvent {
    /// Returns `None` for short payloads or unknown event ids.  Unknown flag
    /// bits are kept so they show up in diagnostics.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let bytes: &[u8; NOTIFICATION_SOURCE_LEN] = data.get(..NOTIFICATION_SOURCE_LEN)?.try_into().ok()?;
        Some(Self {
            event_id: EventId::from_u8(bytes[0])?,
            flags: EventFlags::from_bits_retain(bytes[1]),
            category: CategoryId::from_u8(bytes[2]),
            category_count: bytes[3],
            uid: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }

    pub fn is_pre_existing(&self) -> bool {
        self.flags.contains(EventFlags::PRE_EXISTING)
    }

    /// Encode back to wire bytes (test peers and the replay tool).
    pub fn to_bytes(&self) -> [u8; NOTIFICATION_SOURCE_LEN] {
        let uid = self.uid.to_le_bytes();
        [
            self.event_id as u8,
            self.flags.bits(),
            self.category as u8,
            self.category_count,
            uid[0],
            uid[1],
            uid[2],
            uid[3],
        ]
    }
}

// ---------------------------------------------------------------------------
// Data Source responses
// ---------------------------------------------------------------------------

/// Length of `{command_id, uid:u32}` in front of a notification dictionary.
pub const NOTIFICATION_RESPONSE_HEADER_LEN: usize = 5;

/// A decoded Data Source response, possibly still incomplete.
#[derive(Debug, Clone)]
pub enum Response<'a> {
    Notification(NotificationAttributes<'a>),
    App(AppAttributes<'a>),
}

impl Response<'_> {
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Notification(n) => n.attributes.is_complete(),
            Self::App(a) => a.attributes.is_complete(),
        }
    }
}

/// Parse a full Data Source message (command id included).
///
/// `Ok(None)` means the header itself has not fully arrived yet.
pub fn parse_response(data: &[u8]) -> Result<Option<Response<'_>>, CodecError> {
    let Some((&first, rest)) = data.split_first() else {
        return Ok(None);
    };
    match CommandId::from_u8(first) {
        Some(CommandId::GetNotificationAttributes) => {
            Ok(NotificationAttributes::parse_body(rest)?.map(Response::Notification))
        }
        Some(CommandId::GetAppAttributes) => Ok(AppAttributes::parse_body(rest)?.map(Response::App)),
        _ => Err(CodecError::UnknownCommand(first)),
    }
}

/// Notification attribute response: `{uid:u32, dictionary}`.
#[derive(Debug, Clone)]
pub struct NotificationAttributes<'a> {
    pub uid: NotificationUid,
    pub attributes: Dictionary<'a>,
}

impl<'a> NotificationAttributes<'a> {
    fn parse_body(body: &'a [u8]) -> Result<Option<Self>, CodecError> {
        let Some(uid_bytes) = body.get(..4) else {
            return Ok(None);
        };
        let uid = u32::from_le_bytes([uid_bytes[0], uid_bytes[1], uid_bytes[2], uid_bytes[3]]);
        let attributes = codec::decode(&body[4..], &NOTIFICATION_SCHEMA)?;
        Ok(Some(Self { uid, attributes }))
    }

    fn field(&self, id: NotificationAttributeId) -> Option<&'a [u8]> {
        self.attributes.value(id as u8)
    }

    pub fn app_identifier(&self) -> &'a [u8] {
        self.field(NotificationAttributeId::AppIdentifier).unwrap_or_default()
    }

    pub fn title(&self) -> &'a [u8] {
        self.field(NotificationAttributeId::Title).unwrap_or_default()
    }

    pub fn subtitle(&self) -> &'a [u8] {
        self.field(NotificationAttributeId::Subtitle).unwrap_or_default()
    }

    pub fn message(&self) -> &'a [u8] {
        self.field(NotificationAttributeId::Message).unwrap_or_default()
    }

    pub fn date(&self) -> &'a [u8] {
        self.field(NotificationAttributeId::Date).unwrap_or_default()
    }

    pub fn positive_action_label(&self) -> Option<&'a [u8]> {
        self.field(NotificationAttributeId::PositiveActionLabel)
    }

    pub fn negative_action_label(&self) -> Option<&'a [u8]> {
        self.field(NotificationAttributeId::NegativeActionLabel)
    }
}

/// App attribute response: `{app_id, 0x00, dictionary}`.
#[derive(Debug, Clone)]
pub struct AppAttributes<'a> {
    pub app_id: &'a [u8],
    pub attributes: Dictionary<'a>,
}

impl<'a> AppAttributes<'a> {
    fn parse_body(body: &'a [u8]) -> Result<Option<Self>, CodecError> {
        let Some(nul) = body.iter().position(|&b| b == 0) else {
            return Ok(None);
        };
        if nul == 0 {
            return Err(CodecError::MalformedHeader);
        }
        let attributes = codec::decode(&body[nul + 1..], &APP_SCHEMA)?;
        Ok(Some(Self {
            app_id: &body[..nul],
            attributes,
        }))
    }

    pub fn display_name(&self) -> Option<&'a [u8]> {
        self.attributes.value(AppAttributeId::DisplayName as u8)
    }
}
