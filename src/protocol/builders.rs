//! Control Point request encoders.
//!
//! Requests are built into heap `Vec`s; an allocation failure here aborts
//! through the global allocator like every other allocation on the device.

use super::{ActionId, AppAttributeId, CommandId, NotificationAttributeId, NotificationUid};

/// `GetNotificationAttributes`.
///
/// Attribute order is fixed.  The date goes last: its response length is
/// constant, so the receiver can tell where the dictionary ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetNotificationAttributes {
    pub uid: NotificationUid,
    /// Ask for action labels (iOS 9+ only; older peers reject them).
    pub with_action_labels: bool,
    pub title_max_len: u16,
    pub subtitle_max_len: u16,
    pub message_max_len: u16,
}

impl GetNotificationAttributes {
    pub fn to_vec(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(16);
        msg.push(CommandId::GetNotificationAttributes as u8);
        msg.extend_from_slice(&self.uid.to_le_bytes());
        if self.with_action_labels {
            msg.push(NotificationAttributeId::PositiveActionLabel as u8);
            msg.push(NotificationAttributeId::NegativeActionLabel as u8);
        }
        msg.push(NotificationAttributeId::AppIdentifier as u8);
        msg.push(NotificationAttributeId::Title as u8);
        msg.extend_from_slice(&self.title_max_len.to_le_bytes());
        msg.push(NotificationAttributeId::Subtitle as u8);
        msg.extend_from_slice(&self.subtitle_max_len.to_le_bytes());
        msg.push(NotificationAttributeId::Message as u8);
        msg.extend_from_slice(&self.message_max_len.to_le_bytes());
        msg.push(NotificationAttributeId::Date as u8);
        msg
    }
}

/// Liveness probe: a fetch for a uid the peer never assigns.  Only the app
/// identifier is requested; the peer is expected to reject the uid.
pub fn alive_probe(uid: NotificationUid) -> Vec<u8> {
    let mut msg = Vec::with_capacity(6);
    msg.push(CommandId::GetNotificationAttributes as u8);
    msg.extend_from_slice(&uid.to_le_bytes());
    msg.push(NotificationAttributeId::AppIdentifier as u8);
    msg
}

/// `GetAppAttributes`: `{1, app_id, 0x00, DisplayName}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetAppAttributes<'a> {
    pub app_id: &'a [u8],
}

impl GetAppAttributes<'_> {
    pub fn to_vec(&self) -> Vec<u8> {
        let mut msg = Vec::with_capacity(self.app_id.len() + 3);
        msg.push(CommandId::GetAppAttributes as u8);
        msg.extend_from_slice(self.app_id);
        msg.push(0);
        msg.push(AppAttributeId::DisplayName as u8);
        msg
    }
}

/// `PerformNotificationAction`: `{2, uid:u32, action_id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformNotificationAction {
    pub uid: NotificationUid,
    pub action: ActionId,
}

impl PerformNotificationAction {
    pub fn to_vec(&self) -> Vec<u8> {
        let uid = self.uid.to_le_bytes();
        vec![
            CommandId::PerformNotificationAction as u8,
            uid[0],
            uid[1],
            uid[2],
            uid[3],
            self.action as u8,
        ]
    }
}
