//! ANCS wire definitions.
//!
//! Everything on the wire is byte-granular and little-endian.  Enums here
//! are never transmuted from raw bytes; each has an explicit `from_u8`
//! decoder and an `as u8` encoder.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Peer (iOS device)                       │
//! │                                                            │
//! │  Notification Source ──notify──▶ ┌──────────┐              │
//! │  Data Source ──────────notify──▶ │  Client  │              │
//! │  Control Point ◀────────write─── └──────────┘              │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod builders;
pub mod codec;
pub mod parsers;

// ---------------------------------------------------------------------------
// Service and characteristic UUIDs
// ---------------------------------------------------------------------------

pub const ANCS_SERVICE_UUID: u128 = 0x7905f431_b5ce_4e99_a40f_4b1e122d00d0;
pub const NOTIFICATION_SOURCE_UUID: u128 = 0x9fbf120d_6301_42d9_8c58_25e699a21dbd;
pub const CONTROL_POINT_UUID: u128 = 0x69d1d8f3_45e1_49a8_9821_9bbdfdaad9d9;
pub const DATA_SOURCE_UUID: u128 = 0x22eac6e9_24d6_4bb5_be44_b36ace7c7bfb;

/// Peer-assigned notification identifier.
pub type NotificationUid = u32;

/// Uid used by the liveness probe.  The peer never assigns it, so a
/// fetch for it is always answered with `InvalidParameter`.
pub const PROBE_UID: NotificationUid = u32::MAX;

/// Notification Source payloads are exactly this long.
pub const NOTIFICATION_SOURCE_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Command ids (first byte of Control Point and Data Source messages)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandId {
    GetNotificationAttributes = 0,
    GetAppAttributes = 1,
    PerformNotificationAction = 2,
}

impl CommandId {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::GetNotificationAttributes),
            1 => Some(Self::GetAppAttributes),
            2 => Some(Self::PerformNotificationAction),
            _ => None,
        }
    }

    /// Whether the peer answers this command on the Data Source.
    pub fn has_response(self) -> bool {
        !matches!(self, Self::PerformNotificationAction)
    }
}

// ---------------------------------------------------------------------------
// Notification Source fields
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventId {
    NotificationAdded = 0,
    NotificationModified = 1,
    NotificationRemoved = 2,
}

impl EventId {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::NotificationAdded),
            1 => Some(Self::NotificationModified),
            2 => Some(Self::NotificationRemoved),
            _ => None,
        }
    }
}

bitflags::bitflags! {
    /// Event flags carried by every Notification Source payload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u8 {
        const SILENT = 1 << 0;
        const IMPORTANT = 1 << 1;
        const PRE_EXISTING = 1 << 2;
        const POSITIVE_ACTION = 1 << 3;
        const NEGATIVE_ACTION = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CategoryId {
    Other = 0,
    IncomingCall = 1,
    MissedCall = 2,
    Voicemail = 3,
    Social = 4,
    Schedule = 5,
    Email = 6,
    News = 7,
    HealthAndFitness = 8,
    BusinessAndFinance = 9,
    Location = 10,
    Entertainment = 11,
}

impl CategoryId {
    /// Unknown categories decode as `Other`; newer peers add categories.
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::IncomingCall,
            2 => Self::MissedCall,
            3 => Self::Voicemail,
            4 => Self::Social,
            5 => Self::Schedule,
            6 => Self::Email,
            7 => Self::News,
            8 => Self::HealthAndFitness,
            9 => Self::BusinessAndFinance,
            10 => Self::Location,
            11 => Self::Entertainment,
            _ => Self::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute ids
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NotificationAttributeId {
    AppIdentifier = 0,
    Title = 1,
    Subtitle = 2,
    Message = 3,
    MessageSize = 4,
    Date = 5,
    PositiveActionLabel = 6,
    NegativeActionLabel = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AppAttributeId {
    DisplayName = 0,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActionId {
    Positive = 0,
    Negative = 1,
}

impl ActionId {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Positive),
            1 => Some(Self::Negative),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ANCS ATT error codes (Control Point write responses)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AncsAttError {
    UnknownCommand = 0xA0,
    InvalidCommand = 0xA1,
    InvalidParameter = 0xA2,
    ActionFailed = 0xA3,
}

impl AncsAttError {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0xA0 => Some(Self::UnknownCommand),
            0xA1 => Some(Self::InvalidCommand),
            0xA2 => Some(Self::InvalidParameter),
            0xA3 => Some(Self::ActionFailed),
            _ => None,
        }
    }
}
