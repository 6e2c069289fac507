//! Cross-context action requests.
//!
//! Uses an `embassy-sync` bounded channel to hand `perform_action` calls
//! from UI or other tasks to the context that owns the client.  Posting
//! never blocks; the session drains the channel on its own context.
//!
//! ```text
//! ┌──────────────┐  ActionRequest  ┌──────────────┐
//! │  UI / tasks  │────────────────▶│  AncsSession │
//! │  (any ctx)   │   try_send      │  (BLE ctx)   │
//! └──────────────┘                 └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::error::MailboxError;
use crate::protocol::{ActionId, NotificationUid};

/// Requests that may wait in the mailbox.
pub const MAILBOX_DEPTH: usize = 8;

/// A request to invoke a notification action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRequest {
    pub uid: NotificationUid,
    pub action: ActionId,
}

/// Shared, statically allocatable action mailbox.
pub struct ActionMailbox {
    channel: Channel<CriticalSectionRawMutex, ActionRequest, MAILBOX_DEPTH>,
}

impl Default for ActionMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionMailbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Ask the client to perform `action` on notification `uid`.
    ///
    /// Callable from any context.  Returns [`MailboxError::Full`] if the
    /// owner has not drained earlier requests.
    pub fn perform_action(
        &self,
        uid: NotificationUid,
        action: ActionId,
    ) -> Result<(), MailboxError> {
        self.channel
            .try_send(ActionRequest { uid, action })
            .map_err(|_| {
                warn!("Mailbox: full, dropping {:?} for uid {}", action, uid);
                MailboxError::Full
            })
    }

    /// Take the oldest request.  Owner context only.
    pub fn try_take(&self) -> Option<ActionRequest> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}
