//! Runtime diagnostics.
//!
//! Per-client counters are collected as the client runs and folded into
//! the session's lifetime totals when the client is destroyed.  The
//! snapshot is serde-serializable so hosts can ship it over their own
//! diagnostics channel.
//!
//! The observed event-flag bits are process-wide: every Notification
//! Source event ORs its flags in, letting a host see which flags a peer
//! actually uses.

use core::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Client activity counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncsCounters {
    pub notifications_delivered: u32,
    pub parse_errors: u32,
    pub overflows: u32,
    pub retries: u32,
    pub flushes: u32,
    pub probes_sent: u32,
    pub probe_timeouts: u32,
    pub cache_hits: u32,
    pub cache_misses: u32,
    pub duplicates_dropped: u32,
}

impl AncsCounters {
    /// Add `other` into `self`, saturating.
    pub fn merge(&mut self, other: &Self) {
        self.notifications_delivered = self
            .notifications_delivered
            .saturating_add(other.notifications_delivered);
        self.parse_errors = self.parse_errors.saturating_add(other.parse_errors);
        self.overflows = self.overflows.saturating_add(other.overflows);
        self.retries = self.retries.saturating_add(other.retries);
        self.flushes = self.flushes.saturating_add(other.flushes);
        self.probes_sent = self.probes_sent.saturating_add(other.probes_sent);
        self.probe_timeouts = self.probe_timeouts.saturating_add(other.probe_timeouts);
        self.cache_hits = self.cache_hits.saturating_add(other.cache_hits);
        self.cache_misses = self.cache_misses.saturating_add(other.cache_misses);
        self.duplicates_dropped = self.duplicates_dropped.saturating_add(other.duplicates_dropped);
    }
}

/// Count one occurrence.  Counters stick at `u32::MAX`.
pub fn bump(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

// ───────────────────────────────────────────────────────────────
// Observed event flags
// ───────────────────────────────────────────────────────────────

static OBSERVED_FLAGS: AtomicU8 = AtomicU8::new(0);

/// OR `bits` into the observed-flags set.
///
/// Load and store are separate relaxed operations; concurrent recorders
/// may lose a bit.  Only the client context records.
pub fn record_observed_flags(bits: u8) {
    let seen = OBSERVED_FLAGS.load(Ordering::Relaxed);
    if seen | bits != seen {
        OBSERVED_FLAGS.store(seen | bits, Ordering::Relaxed);
    }
}

/// Every flag bit seen since start-up.
pub fn observed_flags() -> u8 {
    OBSERVED_FLAGS.load(Ordering::Relaxed)
}
