//! Application core: the ANCS protocol, zero I/O.
//!
//! The per-connection [`client`] state machine, the long-lived
//! [`session`] that owns it, and the cross-context [`mailbox`].  All
//! interaction with the BLE stack happens through the **port traits**
//! defined in [`ports`], keeping this layer fully testable without a radio.

pub mod client;
pub mod events;
pub mod mailbox;
pub mod ports;
pub mod session;

pub use client::{AncsClient, CharacteristicSet};
pub use events::{AncsEvent, Notification};
pub use mailbox::{ActionMailbox, ActionRequest};
pub use session::AncsSession;
