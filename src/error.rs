//! Unified error types for the ANCS client.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! client's recovery paths uniform.  All variants are `Copy` so they can be
//! passed through the state machine and event sink without allocation.
//!
//! Recovery is decided by category, not by variant:
//!
//! | Category        | Variants                             | Recovery              |
//! |-----------------|--------------------------------------|-----------------------|
//! | transport-fatal | `Gatt(GattError::Link)`, timeouts    | flush queue           |
//! | local           | `Codec`, `Reassembly`                | drop op, advance      |
//! | caller          | `Discovery`, `Mailbox`, `Config`     | returned to caller    |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A response dictionary is malformed.
    Codec(CodecError),
    /// The reassembly buffer rejected a fragment.
    Reassembly(ReassemblyError),
    /// The GATT transport reported a failure.
    Gatt(GattError),
    /// The discovered characteristics do not form a usable ANCS service.
    Discovery(DiscoveryError),
    /// A cross-context action request could not be posted.
    Mailbox(MailboxError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Reassembly(e) => write!(f, "reassembly: {e}"),
            Self::Gatt(e) => write!(f, "gatt: {e}"),
            Self::Discovery(e) => write!(f, "discovery: {e}"),
            Self::Mailbox(e) => write!(f, "mailbox: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// An attribute id that is not part of the schema.
    UnknownAttribute(u8),
    /// An attribute declared a length above its schema maximum.
    AttributeTooLong { id: u8, length: u16 },
    /// A response header is structurally invalid.
    MalformedHeader,
    /// The command id has no response schema.
    UnknownCommand(u8),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAttribute(id) => write!(f, "unknown attribute id {id}"),
            Self::AttributeTooLong { id, length } => {
                write!(f, "attribute {id} length {length} exceeds schema maximum")
            }
            Self::MalformedHeader => write!(f, "malformed response header"),
            Self::UnknownCommand(id) => write!(f, "unknown command id {id}"),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Reassembly errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyError {
    /// `start` called while a response is already being reassembled.
    AlreadyActive,
    /// `append` called with no response in progress.
    NotActive,
    /// The first byte is not a command that produces a Data-Source response.
    UnknownCommand(u8),
    /// Start called with an empty fragment.
    Empty,
    /// Appending would exceed the fixed buffer length.
    Overflow,
}

impl fmt::Display for ReassemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive => write!(f, "reassembly already active"),
            Self::NotActive => write!(f, "no reassembly in progress"),
            Self::UnknownCommand(id) => write!(f, "fragment starts with unknown command {id}"),
            Self::Empty => write!(f, "empty fragment"),
            Self::Overflow => write!(f, "response exceeds reassembly buffer"),
        }
    }
}

impl From<ReassemblyError> for Error {
    fn from(e: ReassemblyError) -> Self {
        Self::Reassembly(e)
    }
}

// ---------------------------------------------------------------------------
// GATT errors
// ---------------------------------------------------------------------------

/// Failures reported by the GATT transport collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattError {
    /// ATT error response from the peer (ANCS uses 0xA0–0xA3).
    Att(u8),
    /// The link or local stack failed (disconnect, no buffers, timeout).
    Link,
}

impl GattError {
    /// `true` if this failure means the peer can no longer be reached.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Link)
    }
}

impl fmt::Display for GattError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Att(code) => write!(f, "ATT error 0x{code:02X}"),
            Self::Link => write!(f, "link failure"),
        }
    }
}

impl From<GattError> for Error {
    fn from(e: GattError) -> Self {
        Self::Gatt(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryError {
    /// A required characteristic was not among those discovered.
    MissingCharacteristic(&'static str),
    /// The same role was reported twice.
    DuplicateCharacteristic(&'static str),
    /// Two roles share one attribute handle.
    HandleCollision,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCharacteristic(name) => write!(f, "missing {name} characteristic"),
            Self::DuplicateCharacteristic(name) => write!(f, "duplicate {name} characteristic"),
            Self::HandleCollision => write!(f, "characteristics share a handle"),
        }
    }
}

impl From<DiscoveryError> for Error {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Mailbox errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxError {
    /// The mailbox is full; the request was dropped.
    Full,
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "action mailbox full"),
        }
    }
}

impl From<MailboxError> for Error {
    fn from(e: MailboxError) -> Self {
        Self::Mailbox(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
