//! Pairing timing settings.

pub mod defaults;
pub mod model;

pub use defaults::{DEFAULT_RESTART_GRACE_MS, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use model::PairingSettings;
