use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs of one pairing attempt.
///
/// Stored as milliseconds so the TOML stays readable; use the accessors to get
/// `Duration`s, which never return zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingSettings {
    /// Cadence of the status poller
    pub tick_interval_ms: u64,

    /// Deadline of a polling session, measured from its start
    pub timeout_ms: u64,

    /// Wait between a successful remote restart and the QR refetch
    pub restart_grace_ms: u64,
}

impl PairingSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn restart_grace(&self) -> Duration {
        Duration::from_millis(self.restart_grace_ms.max(1))
    }
}
