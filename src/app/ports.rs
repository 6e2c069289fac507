//! Port traits: the hexagonal boundary between the ANCS client and the
//! BLE stack it runs on.
//!
//! ```text
//!   GATT stack ──▶ AncsSession ──▶ GattTransport / TimerPort / EventSink
//! ```
//!
//! The host implements these traits over its real GATT client and timer
//! service.  The client consumes them via generics, so the protocol core
//! never touches a radio and is fully testable with recording mocks.
//!
//! Inbound traffic (notifications, write responses, timer expiries) is not
//! a port: the host calls the session's `handle_*` methods directly.

use embassy_time::Duration;

use crate::error::GattError;

use super::events::AncsEvent;

/// ATT attribute handle of a characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttHandle(pub u16);

/// A characteristic reported by service discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characteristic {
    pub uuid: u128,
    pub handle: AttHandle,
}

// ───────────────────────────────────────────────────────────────
// GATT transport (driven adapter: client → peer)
// ───────────────────────────────────────────────────────────────

/// How the client asks the peer to push a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    Notify,
    Indicate,
}

/// Outbound GATT primitives.
///
/// Both calls only *submit* a request; completion is reported later through
/// the session's `handle_subscribe` / `handle_write_response`.  An `Err`
/// here means the request never left the host.
pub trait GattTransport {
    fn subscribe(&mut self, handle: AttHandle, kind: SubscriptionKind) -> Result<(), GattError>;

    /// Write with response.
    fn write(&mut self, handle: AttHandle, data: &[u8]) -> Result<(), GattError>;
}

// ───────────────────────────────────────────────────────────────
// Timers (driven adapter: client → host timer service)
// ───────────────────────────────────────────────────────────────

/// The one-shot timers a client uses.  At most one of each is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Next liveness probe is due.
    AliveCheck,
    /// The outstanding probe went unanswered.
    AliveResponse,
    /// Resubmit a failed notification fetch.
    WriteRetry,
}

impl TimerId {
    pub fn name(self) -> &'static str {
        match self {
            Self::AliveCheck => "alive-check",
            Self::AliveResponse => "alive-response",
            Self::WriteRetry => "write-retry",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "alive-check" => Some(Self::AliveCheck),
            "alive-response" => Some(Self::AliveResponse),
            "write-retry" => Some(Self::WriteRetry),
            _ => None,
        }
    }
}

/// One-shot timer service.  When a timer expires the host calls
/// `AncsSession::handle_timer` on the client's context.
pub trait TimerPort {
    /// Arm `timer`, replacing any earlier deadline for it.
    fn start(&mut self, timer: TimerId, after: Duration);

    /// Disarm `timer`.  Cancelling an idle timer is a no-op.
    fn cancel(&mut self, timer: TimerId);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: client → UI / storage / log)
// ───────────────────────────────────────────────────────────────

/// The client emits decoded [`AncsEvent`]s through this port.  Events
/// borrow the client's buffers; sinks copy what they keep.
pub trait EventSink {
    fn emit(&mut self, event: &AncsEvent<'_>);
}

/// Everything a client needs from its host, as one bound.
pub trait ClientPorts: GattTransport + TimerPort + EventSink {}

impl<T: GattTransport + TimerPort + EventSink> ClientPorts for T {}
