//! ANCS client configuration parameters
//!
//! All tunable parameters for the ANCS client.
//! Values can be overridden by the host application before a session is created.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AncsConfig {
    // --- Liveness ---
    /// Interval between heartbeat probes (seconds)
    pub alive_check_interval_secs: u32,
    /// How long to wait for the probe's write response (seconds)
    pub alive_response_timeout_secs: u32,

    // --- Recovery ---
    /// Delay before resubmitting a failed notification fetch (milliseconds)
    pub write_retry_delay_ms: u32,

    // --- Fetch policy ---
    /// Fetch notifications the peer flags as pre-existing on (re)connect
    pub fetch_pre_existing: bool,
    /// Maximum title length requested from the peer (bytes)
    pub title_max_len: u16,
    /// Maximum subtitle length requested from the peer (bytes)
    pub subtitle_max_len: u16,
    /// Maximum message length requested from the peer (bytes)
    pub message_max_len: u16,
}

impl Default for AncsConfig {
    fn default() -> Self {
        Self {
            // Liveness
            alive_check_interval_secs: 60 * 60, // hourly
            alive_response_timeout_secs: 5,

            // Recovery
            write_retry_delay_ms: 1000,

            // Fetch policy
            fetch_pre_existing: false,
            title_max_len: 40,
            subtitle_max_len: 40,
            message_max_len: 200,
        }
    }
}

impl AncsConfig {
    pub fn alive_check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.alive_check_interval_secs))
    }

    pub fn alive_response_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.alive_response_timeout_secs))
    }

    pub fn write_retry_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.write_retry_delay_ms))
    }

    /// Reject values that would make the client misbehave.
    ///
    /// The requested lengths must not exceed the schema bounds the decoder
    /// enforces, otherwise every conforming response would be rejected.
    pub fn validate(&self) -> Result<()> {
        use crate::protocol::codec::{MESSAGE_MAX_LEN, SUBTITLE_MAX_LEN, TITLE_MAX_LEN};

        if self.alive_check_interval_secs == 0 {
            return Err(Error::Config("alive_check_interval_secs must be > 0"));
        }
        if self.alive_response_timeout_secs == 0
            || self.alive_response_timeout_secs >= self.alive_check_interval_secs
        {
            return Err(Error::Config(
                "alive_response_timeout_secs must be > 0 and below the check interval",
            ));
        }
        if self.write_retry_delay_ms == 0 {
            return Err(Error::Config("write_retry_delay_ms must be > 0"));
        }
        if self.title_max_len == 0 || self.title_max_len > TITLE_MAX_LEN {
            return Err(Error::Config("title_max_len out of range"));
        }
        if self.subtitle_max_len == 0 || self.subtitle_max_len > SUBTITLE_MAX_LEN {
            return Err(Error::Config("subtitle_max_len out of range"));
        }
        if self.message_max_len == 0 || self.message_max_len > MESSAGE_MAX_LEN {
            return Err(Error::Config("message_max_len out of range"));
        }
        Ok(())
    }
}
