use serde::{Deserialize, Serialize};

use super::outcome::QrPayload;
use super::state_machine::Generation;
use crate::ids::InstanceId;

/// UI-facing connection status
///
/// 对外暴露的连接状态,是内部 `ConnectionPhase` 的投影。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    AwaitingScan,
    Connected,
}

/// Snapshot of the current pairing attempt.
///
/// Only `ConnectionStateMachine::snapshot` builds non-default values, so a
/// QR payload is never present unless `status` is `AwaitingScan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ConnectionState {
    status: ConnectionStatus,
    qr_payload: Option<QrPayload>,
    is_busy: bool,
    is_polling: bool,
    instance_id: Option<InstanceId>,
    session_generation: Option<Generation>,
    last_error: Option<String>,
}

impl ConnectionState {
    pub(crate) fn project(
        status: ConnectionStatus,
        qr_payload: Option<QrPayload>,
        is_busy: bool,
        is_polling: bool,
        instance_id: Option<InstanceId>,
        session_generation: Option<Generation>,
        last_error: Option<String>,
    ) -> Self {
        let qr_payload = match status {
            ConnectionStatus::AwaitingScan => qr_payload,
            _ => None,
        };
        Self {
            status,
            qr_payload,
            is_busy,
            is_polling,
            instance_id,
            session_generation,
            last_error,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn qr_payload(&self) -> Option<&QrPayload> {
        self.qr_payload.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    pub fn is_polling(&self) -> bool {
        self.is_polling
    }

    pub fn instance_id(&self) -> Option<&InstanceId> {
        self.instance_id.as_ref()
    }

    pub fn session_generation(&self) -> Option<Generation> {
        self.session_generation
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
