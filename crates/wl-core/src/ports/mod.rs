//! Port interfaces for the application layer
//!
//! Ports define the contract between the connection use cases and the
//! infrastructure implementations (HTTP gateway, auth token source). The
//! orchestrator only ever talks to the remote instance through these traits.

pub mod access_token;
pub mod instance_gateway;

pub use access_token::AccessTokenPort;
pub use instance_gateway::InstanceGatewayPort;
