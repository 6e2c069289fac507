//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                         | Connects to          |
//! |------------|------------------------------------|----------------------|
//! | `log_sink` | EventSink                          | `log` output         |
//! | `trace`    | GattTransport, TimerPort, EventSink | Recorded text trace |
//!
//! Production hosts supply their own GATT and timer adapters; these two
//! cover logging and offline replay.

pub mod log_sink;
pub mod trace;
