//! Business logic use cases
//!
//! ```text
//! connect()
//!    ↓
//! InitializationResolver ── already connected ──→ done
//!    ↓ needs qr / is connecting
//! QrProvisioner → StatusPoller ── open ──→ done
//!                     ↓ timeout
//!               RestartCoordinator → StatusPoller (new generation)
//! ```

pub mod connection;
