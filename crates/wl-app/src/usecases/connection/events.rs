use async_trait::async_trait;
use tokio::sync::mpsc;

use wl_core::{ConnectionNotice, Generation, InstanceId, QrPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionDomainEvent {
    QrCodeReady {
        instance_id: InstanceId,
        qr_payload: QrPayload,
    },
    Connected {
        instance_id: Option<InstanceId>,
    },
    /// Still waiting for the scan; the instance is restarted for a fresh QR code
    PairingTimedOut {
        instance_id: InstanceId,
        generation: Generation,
    },
    Disconnected,
    ConnectionFailed {
        message: String,
    },
    LogoutFailed {
        message: String,
    },
}

impl From<ConnectionNotice> for ConnectionDomainEvent {
    fn from(notice: ConnectionNotice) -> Self {
        match notice {
            ConnectionNotice::QrCodeReady {
                instance_id,
                payload,
            } => Self::QrCodeReady {
                instance_id,
                qr_payload: payload,
            },
            ConnectionNotice::Connected { instance_id } => Self::Connected { instance_id },
            ConnectionNotice::RestartingInstance {
                instance_id,
                generation,
            } => Self::PairingTimedOut {
                instance_id,
                generation,
            },
            ConnectionNotice::Disconnected => Self::Disconnected,
            ConnectionNotice::Failed { message } => Self::ConnectionFailed { message },
            ConnectionNotice::LogoutFailed { message } => Self::LogoutFailed { message },
        }
    }
}

#[async_trait]
pub trait ConnectionEventPort: Send + Sync {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<ConnectionDomainEvent>>;
}
