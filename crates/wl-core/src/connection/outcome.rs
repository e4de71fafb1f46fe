use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::InstanceId;

/// Opaque pairing payload (QR image data URI or pairing code).
///
/// The orchestrator never looks inside; `Debug` only prints the length so
/// multi-kilobyte data URIs stay out of the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QrPayload(String);

impl QrPayload {
    pub fn new(payload: String) -> Self {
        Self(payload)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for QrPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QrPayload({} bytes)", self.0.len())
    }
}

impl From<String> for QrPayload {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for QrPayload {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How the user links the device: scanning a QR image or typing a pairing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMethod {
    #[default]
    QrCode,
    PairingCode,
}

/// Classification of the remote instance on a fresh `connect()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Profile lacks a phone number; no instance exists yet
    NeedsPhoneNumber,

    /// Instance exists but is not authenticated; fetch a QR code
    NeedsQrCode(InstanceId),

    /// Same, but the gateway asked for a pairing code instead of a QR image
    NeedsPairingCode(InstanceId),

    /// The reply already carried the pairing payload (fresh instances do)
    PayloadReady {
        instance_id: InstanceId,
        method: PairingMethod,
        payload: QrPayload,
    },

    /// Instance is mid-handshake; resume polling without a new QR code
    IsConnecting(InstanceId),

    /// Nothing left to do. Carries the instance id when the gateway reports it
    AlreadyConnected(Option<InstanceId>),

    /// Gateway reported an error or the call failed
    Error(String),
}

/// Result of asking the gateway for a pairing payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned {
    Qr(QrPayload),
    /// The QR endpoint found the instance already paired
    AlreadyConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_method_defaults_to_qr_code() {
        assert_eq!(PairingMethod::default(), PairingMethod::QrCode);
        assert_eq!(
            serde_json::to_string(&PairingMethod::PairingCode).unwrap(),
            "\"pairing_code\""
        );
    }

    #[test]
    fn test_qr_payload_debug_hides_content() {
        let payload = QrPayload::from("data:image/png;base64,iVBORw0KGgo=");
        let debug = format!("{:?}", payload);
        assert_eq!(debug, "QrPayload(34 bytes)");
        assert!(!debug.contains("base64"));
    }
}
