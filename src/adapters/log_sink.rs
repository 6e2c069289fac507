//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured ANCS events to the `log`
//! facade.  A renderer or notification store would implement the same
//! trait.

use std::borrow::Cow;

use log::info;

use crate::app::events::AncsEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AncsEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events logged so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

/// Lossy UTF-8 view of peer-supplied bytes.
fn text(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AncsEvent<'_>) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AncsEvent::NotificationReceived(n) => {
                info!(
                    "NOTIF | uid={} | {:?} | app={} ({}) | title=\"{}\" subtitle=\"{}\" | \
                     message=\"{}\" | date={} | flags=0b{:08b}",
                    n.uid,
                    n.category,
                    text(n.app_identifier),
                    n.app_name.map_or(Cow::Borrowed("?"), text),
                    text(n.title),
                    text(n.subtitle),
                    text(n.message),
                    text(n.date),
                    n.flags.bits(),
                );
                if n.positive_action_label.is_some() || n.negative_action_label.is_some() {
                    info!(
                        "NOTIF | uid={} | actions: +\"{}\" -\"{}\"",
                        n.uid,
                        text(n.positive_action_label.unwrap_or_default()),
                        text(n.negative_action_label.unwrap_or_default()),
                    );
                }
            }
            AncsEvent::NotificationRemoved { uid } => {
                info!("NOTIF | uid={} removed", uid);
            }
            AncsEvent::ActionCompleted { uid, action, result } => match result {
                Ok(()) => info!("ACTION | uid={} {:?} ok", uid, action),
                Err(e) => info!("ACTION | uid={} {:?} failed: {}", uid, action, e),
            },
            AncsEvent::Disconnected => {
                info!("ANCS | disconnected");
            }
        }
    }
}
