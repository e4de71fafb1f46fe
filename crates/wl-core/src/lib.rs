//! # wl-core
//!
//! Core domain models for walink: the instance identifiers, the wire contract
//! of the remote instance gateway, and the pure connection state machine.
//!
//! This crate contains pure business logic without any infrastructure dependencies.

pub mod config;
pub mod connection;
pub mod gateway;
pub mod ids;
pub mod ports;
pub mod settings;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use connection::{
    Attempt, ConnectionAction, ConnectionEvent, ConnectionNotice, ConnectionPhase,
    ConnectionState, ConnectionStateMachine, ConnectionStatus, DisconnectError, Generation,
    InitError, InitOutcome, OrchestratorError, PairingMethod, Provisioned, QrError, QrPayload,
    RestartError,
};
pub use gateway::GatewayError;
pub use ids::InstanceId;
pub use settings::PairingSettings;
