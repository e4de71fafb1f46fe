//! Connection domain models and state machine.

pub mod error;
pub mod outcome;
pub mod state;
pub mod state_machine;

pub use error::{DisconnectError, InitError, OrchestratorError, QrError, RestartError};
pub use outcome::{InitOutcome, PairingMethod, Provisioned, QrPayload};
pub use state::{ConnectionState, ConnectionStatus};
pub use state_machine::{
    Attempt, ConnectionAction, ConnectionEvent, ConnectionNotice, ConnectionPhase,
    ConnectionStateMachine, Generation,
};
