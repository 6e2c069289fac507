//! Client state identity and transition guard.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │         ┌──────────────▶ RequestedNotification ◀──┐          │
//! │         │                  │      │                │          │
//! │         │                  │      ▼                │          │
//! │         │                  │   Retrying ───────────┘          │
//! │         │                  ▼                                  │
//! │       Idle ◀──── ReassemblingNotification ──▶ RequestedApp    │
//! │       ▲ │ │                                          │        │
//! │       │ │ └──────────▶ PerformingAction              │        │
//! │       │ └────────────▶ AliveCheck                    │        │
//! │       └──────────────── (every state) ◀──────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every state returns to `Idle`: on completion, on a dropped op, and on a
//! flush.  Work always starts from `Idle`, so the queue never skips the
//! guard.  Re-entering the current state is permitted.

use log::{error, info};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Protocol state of one connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClientState {
    Idle = 0,
    RequestedNotification = 1,
    ReassemblingNotification = 2,
    RequestedApp = 3,
    PerformingAction = 4,
    AliveCheck = 5,
    Retrying = 6,
}

impl ClientState {
    /// Total number of states.
    pub const COUNT: usize = 7;

    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::Idle),
            1 => Some(Self::RequestedNotification),
            2 => Some(Self::ReassemblingNotification),
            3 => Some(Self::RequestedApp),
            4 => Some(Self::PerformingAction),
            5 => Some(Self::AliveCheck),
            6 => Some(Self::Retrying),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::RequestedNotification => "RequestedNotification",
            Self::ReassemblingNotification => "ReassemblingNotification",
            Self::RequestedApp => "RequestedApp",
            Self::PerformingAction => "PerformingAction",
            Self::AliveCheck => "AliveCheck",
            Self::Retrying => "Retrying",
        }
    }
}

/// Whether `from -> to` is in the transition table.
pub fn is_valid_transition(from: ClientState, to: ClientState) -> bool {
    use ClientState::*;

    if from == to || to == Idle {
        return true;
    }
    matches!(
        (from, to),
        (Idle, RequestedNotification)
            | (Idle, PerformingAction)
            | (Idle, AliveCheck)
            | (RequestedNotification, Retrying)
            | (RequestedNotification, ReassemblingNotification)
            | (Retrying, RequestedNotification)
            | (ReassemblingNotification, RequestedApp)
    )
}

// ---------------------------------------------------------------------------
// Guarded state holder
// ---------------------------------------------------------------------------

/// Current state plus a count of accepted transitions.
#[derive(Debug)]
pub struct StateMachine {
    current: ClientState,
    transitions: u32,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub const fn new() -> Self {
        Self {
            current: ClientState::Idle,
            transitions: 0,
        }
    }

    pub fn current(&self) -> ClientState {
        self.current
    }

    pub fn is_idle(&self) -> bool {
        self.current == ClientState::Idle
    }

    /// Number of accepted transitions, same-state ones excluded.
    pub fn transition_count(&self) -> u32 {
        self.transitions
    }

    /// Move to `next` if the table allows it.  A rejected transition is
    /// logged and leaves the state unchanged.
    pub fn transition(&mut self, next: ClientState) -> bool {
        if !is_valid_transition(self.current, next) {
            error!(
                "ANCS transition rejected: {} -> {}",
                self.current.name(),
                next.name()
            );
            return false;
        }
        if next != self.current {
            info!("ANCS transition: {} -> {}", self.current.name(), next.name());
            self.current = next;
            self.transitions = self.transitions.wrapping_add(1);
        }
        true
    }
}
