//! walink Application Orchestration Layer
//!
//! This crate contains the connection use cases and the runtime orchestrator
//! that drives the pairing state machine.

pub mod deps;
pub mod usecases;

pub use deps::ConnectionDeps;
pub use usecases::connection::{
    ConnectionDomainEvent, ConnectionEventPort, ConnectionFacade, ConnectionOrchestrator,
};
