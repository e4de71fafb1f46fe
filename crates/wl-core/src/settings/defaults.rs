use super::model::*;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 4_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_RESTART_GRACE_MS: u64 = 3_000;

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            restart_grace_ms: DEFAULT_RESTART_GRACE_MS,
        }
    }
}
