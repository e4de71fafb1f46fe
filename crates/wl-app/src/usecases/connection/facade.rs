use tokio::sync::watch;

use wl_core::{ConnectionState, OrchestratorError};

/// Public surface of the connection orchestrator.
///
/// `connect` and `disconnect` only enqueue; progress is observed through
/// `watch_state` and the event subscription.
pub trait ConnectionFacade: Send + Sync {
    fn connect(&self) -> Result<(), OrchestratorError>;
    fn disconnect(&self) -> Result<(), OrchestratorError>;
    fn state(&self) -> ConnectionState;
    fn watch_state(&self) -> watch::Receiver<ConnectionState>;
}
