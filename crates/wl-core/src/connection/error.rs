use thiserror::Error;

use crate::gateway::GatewayError;
use crate::ids::InstanceId;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InitError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("gateway reported state '{state}' without an instance id")]
    MissingInstanceId { state: String },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QrError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("instance not found: {0}")]
    InstanceNotFound(InstanceId),

    #[error("qr code request rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RestartError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("restart rejected: {0}")]
    Rejected(String),

    #[error("failed to fetch qr code after restart: {0}")]
    QrRefetch(#[from] QrError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DisconnectError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("logout rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("connection orchestrator is closed")]
    Closed,
}
