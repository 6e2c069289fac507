//! Peer liveness monitor.
//!
//! A bonded iPhone can vanish without the link layer noticing for a long
//! time.  Periodically the client sends a fetch for a uid the peer never
//! assigns; a live peer answers at once with `InvalidParameter`, a dead one
//! says nothing and the response timer expires.
//!
//! ```text
//!            start()                 check due, client idle
//!  Stopped ─────────▶ Waiting ─────────────────────────────▶ AwaitingResponse
//!                      │  ▲                                     │     │
//!  check due, client   │  │ any write response / timeout        │     │
//!  busy                ▼  └─────────────────────────────────────┘     │
//!                    Pending ── client idle again ── probe_sent() ────┘
//! ```
//!
//! The monitor owns the probe bookkeeping only; the client sends the probe
//! and decides what a timeout means.

use embassy_time::Duration;
use log::{debug, info};

use crate::app::ports::{TimerId, TimerPort};
use crate::config::AncsConfig;

/// Where the heartbeat cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// No service attached.
    Stopped,
    /// Next-check timer armed.
    Waiting,
    /// Check came due while the client was busy; probe before further work.
    Pending,
    /// Probe written; response timer armed.
    AwaitingResponse,
}

/// What the client should do when the next-check timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckDecision {
    /// Client is idle: send the probe now.
    ProbeNow,
    /// Client is busy: probe once it returns to idle.
    Deferred,
    /// Stale expiry; nothing to do.
    Ignore,
}

pub struct LivenessMonitor {
    state: ProbeState,
    interval: Duration,
    response_timeout: Duration,
}

impl LivenessMonitor {
    pub fn new(config: &AncsConfig) -> Self {
        Self {
            state: ProbeState::Stopped,
            interval: config.alive_check_interval(),
            response_timeout: config.alive_response_timeout(),
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    /// A probe is owed and must run before the next queued op.
    pub fn is_pending(&self) -> bool {
        self.state == ProbeState::Pending
    }

    /// Arm the first next-check timer.
    pub fn start(&mut self, timers: &mut impl TimerPort) {
        timers.start(TimerId::AliveCheck, self.interval);
        self.state = ProbeState::Waiting;
        debug!("Liveness: started, next check in {}s", self.interval.as_secs());
    }

    /// Cancel both timers.
    pub fn stop(&mut self, timers: &mut impl TimerPort) {
        timers.cancel(TimerId::AliveCheck);
        timers.cancel(TimerId::AliveResponse);
        self.state = ProbeState::Stopped;
    }

    /// The next-check timer fired.
    pub fn on_check_due(&mut self, client_idle: bool) -> CheckDecision {
        if self.state != ProbeState::Waiting {
            return CheckDecision::Ignore;
        }
        if client_idle {
            CheckDecision::ProbeNow
        } else {
            info!("Liveness: client busy, deferring probe");
            self.state = ProbeState::Pending;
            CheckDecision::Deferred
        }
    }

    /// The probe was handed to the transport.
    pub fn probe_sent(&mut self, timers: &mut impl TimerPort) {
        timers.start(TimerId::AliveResponse, self.response_timeout);
        self.state = ProbeState::AwaitingResponse;
    }

    /// The probe could not be submitted, or the owed probe was discarded
    /// by a flush.  Try again next interval.
    pub fn abandon_probe(&mut self, timers: &mut impl TimerPort) {
        self.reschedule(timers);
    }

    /// A Control Point write response arrived.  Returns `true` if it
    /// answered an outstanding probe.
    pub fn on_response(&mut self, timers: &mut impl TimerPort) -> bool {
        if self.state != ProbeState::AwaitingResponse {
            return false;
        }
        debug!("Liveness: peer alive");
        self.reschedule(timers);
        true
    }

    /// The response timer fired.  Returns `true` if a probe really went
    /// unanswered (the peer is presumed gone).
    pub fn on_response_timeout(&mut self, timers: &mut impl TimerPort) -> bool {
        if self.state != ProbeState::AwaitingResponse {
            return false;
        }
        self.reschedule(timers);
        true
    }

    fn reschedule(&mut self, timers: &mut impl TimerPort) {
        timers.cancel(TimerId::AliveResponse);
        timers.start(TimerId::AliveCheck, self.interval);
        self.state = ProbeState::Waiting;
    }
}
