//! Apple Notification Center Service (ANCS) client.
//!
//! Fetches notification and app metadata from a bonded iOS device over
//! three GATT characteristics, reassembling fragmented responses and
//! serializing requests through a single-in-flight queue.  The BLE stack,
//! timers and notification presentation are host concerns reached through
//! the port traits in [`app::ports`].
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │   host GATT client   host timers   LogEventSink   ReplayPorts  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  AncsSession ─▶ AncsClient                             │    │
//! │  │  Queue · Reassembly · Liveness · AppNameCache          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  protocol: codec · builders · parsers                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fsm;
pub mod liveness;
pub mod protocol;
pub mod queue;
pub mod reassembly;

pub use app::{AncsEvent, AncsSession, ActionMailbox};
pub use config::AncsConfig;
pub use error::{Error, Result};
