//! Trace replay adapter.
//!
//! Drives an [`AncsSession`] from a line-oriented text trace instead of a
//! radio, for reproducing field captures on a host.  One command per line;
//! blank lines and `#` comments are skipped.
//!
//! | Command                          | Delivered as                          |
//! |----------------------------------|---------------------------------------|
//! | `discover`                       | `service_discovered` (fixed handles)  |
//! | `ns <hex>`                       | Notification Source notification      |
//! | `ds <hex>`                       | Data Source notification              |
//! | `wr ok` / `wr err <code>` / `wr link` | Control Point write response     |
//! | `timer <name>`                   | `handle_timer`                        |
//! | `action <uid> <positive/negative>` | mailbox post + drain                |
//! | `ios9`                           | `ios9_or_newer_detected`              |
//! | `disconnect`                     | `invalidate_references`               |
//!
//! [`ReplayPorts`] logs every outbound write and timer request and forwards
//! events to an inner sink.

use core::fmt;

use embassy_time::Duration;
use log::info;

use crate::app::events::AncsEvent;
use crate::app::ports::{
    AttHandle, Characteristic, EventSink, GattTransport, SubscriptionKind, TimerId, TimerPort,
};
use crate::app::session::AncsSession;
use crate::error::{GattError, Result};
use crate::protocol::{
    ActionId, CONTROL_POINT_UUID, DATA_SOURCE_UUID, NOTIFICATION_SOURCE_UUID, NotificationUid,
};

/// Handles assigned to the ANCS characteristics by `discover`.
pub const NOTIFICATION_SOURCE_HANDLE: AttHandle = AttHandle(0x0010);
pub const CONTROL_POINT_HANDLE: AttHandle = AttHandle(0x0013);
pub const DATA_SOURCE_HANDLE: AttHandle = AttHandle(0x0016);

/// The characteristic list `discover` reports.
pub fn replay_characteristics() -> [Characteristic; 3] {
    [
        Characteristic {
            uuid: NOTIFICATION_SOURCE_UUID,
            handle: NOTIFICATION_SOURCE_HANDLE,
        },
        Characteristic {
            uuid: CONTROL_POINT_UUID,
            handle: CONTROL_POINT_HANDLE,
        },
        Characteristic {
            uuid: DATA_SOURCE_UUID,
            handle: DATA_SOURCE_HANDLE,
        },
    ]
}

// ───────────────────────────────────────────────────────────────
// Trace commands
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceCommand {
    Discover,
    NotificationSource(Vec<u8>),
    DataSource(Vec<u8>),
    WriteResponse(core::result::Result<(), GattError>),
    Timer(TimerId),
    Action { uid: NotificationUid, action: ActionId },
    Ios9,
    Disconnect,
}

/// A trace line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceError {
    pub line: usize,
    pub reason: &'static str,
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for TraceError {}

/// Parse a whole trace.  Line numbers in errors are 1-based.
pub fn parse_trace(text: &str) -> core::result::Result<Vec<TraceCommand>, TraceError> {
    let mut commands = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(cmd)) => commands.push(cmd),
            Ok(None) => {}
            Err(reason) => return Err(TraceError { line: idx + 1, reason }),
        }
    }
    Ok(commands)
}

/// Parse one line.  `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> core::result::Result<Option<TraceCommand>, &'static str> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };

    let command = match keyword {
        "discover" => TraceCommand::Discover,
        "ios9" => TraceCommand::Ios9,
        "disconnect" => TraceCommand::Disconnect,
        "ns" => TraceCommand::NotificationSource(parse_hex(words.by_ref())?),
        "ds" => TraceCommand::DataSource(parse_hex(words.by_ref())?),
        "wr" => TraceCommand::WriteResponse(match words.next() {
            Some("ok") => Ok(()),
            Some("link") => Err(GattError::Link),
            Some("err") => {
                let code = words.next().ok_or("missing ATT error code")?;
                let code = code.trim_start_matches("0x");
                Err(GattError::Att(
                    u8::from_str_radix(code, 16).map_err(|_| "bad ATT error code")?,
                ))
            }
            _ => return Err("expected ok, err <code> or link"),
        }),
        "timer" => {
            let name = words.next().ok_or("missing timer name")?;
            TraceCommand::Timer(TimerId::from_name(name).ok_or("unknown timer")?)
        }
        "action" => {
            let uid = words
                .next()
                .and_then(|w| w.parse().ok())
                .ok_or("missing or bad uid")?;
            let action = match words.next() {
                Some("positive") => ActionId::Positive,
                Some("negative") => ActionId::Negative,
                _ => return Err("expected positive or negative"),
            };
            TraceCommand::Action { uid, action }
        }
        _ => return Err("unknown command"),
    };

    if words.next().is_some() {
        return Err("trailing input");
    }
    Ok(Some(command))
}

/// Hex bytes, optionally split by whitespace: `00 2a00` or `002a00`.
fn parse_hex<'a>(words: impl Iterator<Item = &'a str>) -> core::result::Result<Vec<u8>, &'static str> {
    let digits: String = words.collect();
    if digits.is_empty() {
        return Err("missing payload");
    }
    if !digits.is_ascii() {
        return Err("bad hex digit");
    }
    if digits.len() % 2 != 0 {
        return Err("odd number of hex digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| "bad hex digit"))
        .collect()
}

// ───────────────────────────────────────────────────────────────
// Replay
// ───────────────────────────────────────────────────────────────

/// Deliver one command to `session`.
pub fn apply<S: EventSink>(
    session: &mut AncsSession<'_>,
    ports: &mut ReplayPorts<S>,
    command: TraceCommand,
) -> Result<()> {
    match command {
        TraceCommand::Discover => session.service_discovered(&replay_characteristics(), ports)?,
        TraceCommand::NotificationSource(data) => {
            session.handle_notification_or_read(NOTIFICATION_SOURCE_HANDLE, &data, Ok(()), ports);
        }
        TraceCommand::DataSource(data) => {
            session.handle_notification_or_read(DATA_SOURCE_HANDLE, &data, Ok(()), ports);
        }
        TraceCommand::WriteResponse(result) => {
            session.handle_write_response(CONTROL_POINT_HANDLE, result, ports);
        }
        TraceCommand::Timer(timer) => {
            ports.disarm(timer);
            session.handle_timer(timer, ports);
        }
        TraceCommand::Action { uid, action } => session.perform_action(uid, action, ports)?,
        TraceCommand::Ios9 => session.ios9_or_newer_detected(),
        TraceCommand::Disconnect => session.invalidate_references(ports),
    }
    Ok(())
}

/// Host ports for replay: writes and timers are logged and recorded, never
/// sent anywhere.
pub struct ReplayPorts<S> {
    sink: S,
    writes: Vec<(AttHandle, Vec<u8>)>,
    subscriptions: Vec<AttHandle>,
    armed: Vec<(TimerId, Duration)>,
}

impl<S> ReplayPorts<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            writes: Vec::new(),
            subscriptions: Vec::new(),
            armed: Vec::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Every Control Point write so far, oldest first.
    pub fn writes(&self) -> &[(AttHandle, Vec<u8>)] {
        &self.writes
    }

    pub fn subscriptions(&self) -> &[AttHandle] {
        &self.subscriptions
    }

    pub fn is_armed(&self, timer: TimerId) -> bool {
        self.armed.iter().any(|(t, _)| *t == timer)
    }

    fn disarm(&mut self, timer: TimerId) {
        self.armed.retain(|(t, _)| *t != timer);
    }
}

impl<S> GattTransport for ReplayPorts<S> {
    fn subscribe(&mut self, handle: AttHandle, kind: SubscriptionKind) -> core::result::Result<(), GattError> {
        info!("Replay: subscribe {:?} handle=0x{:04X}", kind, handle.0);
        self.subscriptions.push(handle);
        Ok(())
    }

    fn write(&mut self, handle: AttHandle, data: &[u8]) -> core::result::Result<(), GattError> {
        let hex: String = data.iter().map(|b| format!("{b:02x}")).collect();
        info!("Replay: write handle=0x{:04X} {}", handle.0, hex);
        self.writes.push((handle, data.to_vec()));
        Ok(())
    }
}

impl<S> TimerPort for ReplayPorts<S> {
    fn start(&mut self, timer: TimerId, after: Duration) {
        info!("Replay: arm {} in {}ms", timer.name(), after.as_millis());
        self.disarm(timer);
        self.armed.push((timer, after));
    }

    fn cancel(&mut self, timer: TimerId) {
        self.disarm(timer);
    }
}

impl<S: EventSink> EventSink for ReplayPorts<S> {
    fn emit(&mut self, event: &AncsEvent<'_>) {
        self.sink.emit(event);
    }
}
