//! Outbound ANCS events.
//!
//! The client emits these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: render,
//! store, filter, log.

use crate::error::GattError;
use crate::protocol::parsers::NotificationAttributes;
use crate::protocol::{ActionId, CategoryId, EventFlags, NotificationUid};

/// Structured events emitted by the client.
#[derive(Debug, Clone)]
pub enum AncsEvent<'a> {
    /// A notification's attributes were fetched and decoded.
    NotificationReceived(Notification<'a>),

    /// The peer removed a notification.
    NotificationRemoved { uid: NotificationUid },

    /// The peer answered a `PerformNotificationAction`.
    ActionCompleted {
        uid: NotificationUid,
        action: ActionId,
        result: Result<(), GattError>,
    },

    /// The peer stopped answering; pending work was discarded.
    Disconnected,
}

/// A decoded notification.  All byte fields borrow from the response
/// buffer and are raw UTF-8 as sent by the peer, truncated to the
/// requested maximum lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification<'a> {
    pub uid: NotificationUid,
    pub flags: EventFlags,
    pub category: CategoryId,
    pub app_identifier: &'a [u8],
    /// `None` when the display name could not be resolved.
    pub app_name: Option<&'a [u8]>,
    pub title: &'a [u8],
    pub subtitle: &'a [u8],
    pub message: &'a [u8],
    /// `yyyyMMdd'T'HHmmSS`.
    pub date: &'a [u8],
    pub positive_action_label: Option<&'a [u8]>,
    pub negative_action_label: Option<&'a [u8]>,
}

impl<'a> Notification<'a> {
    pub fn from_attributes(
        attributes: &NotificationAttributes<'a>,
        flags: EventFlags,
        category: CategoryId,
        app_name: Option<&'a [u8]>,
    ) -> Self {
        Self {
            uid: attributes.uid,
            flags,
            category,
            app_identifier: attributes.app_identifier(),
            app_name,
            title: attributes.title(),
            subtitle: attributes.subtitle(),
            message: attributes.message(),
            date: attributes.date(),
            positive_action_label: attributes.positive_action_label(),
            negative_action_label: attributes.negative_action_label(),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.flags.contains(EventFlags::SILENT)
    }

    pub fn is_important(&self) -> bool {
        self.flags.contains(EventFlags::IMPORTANT)
    }
}
