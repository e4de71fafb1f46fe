use std::sync::Arc;

use tracing::{info_span, Instrument};
use wl_core::gateway::InitializeResponse;
use wl_core::ports::InstanceGatewayPort;
use wl_core::{InitError, InitOutcome, InstanceId, PairingMethod, QrPayload};

const DEFAULT_INIT_ERROR: &str = "failed to initialize the WhatsApp connection";

/// Decides which branch a fresh `connect()` enters.
///
/// One gateway call, no retries.
pub struct InitializationResolver {
    gateway: Arc<dyn InstanceGatewayPort>,
}

impl InitializationResolver {
    pub fn new(gateway: Arc<dyn InstanceGatewayPort>) -> Self {
        Self { gateway }
    }

    pub async fn initialize(&self) -> Result<InitOutcome, InitError> {
        let span = info_span!("connection.initialize");
        async {
            let response = self.gateway.initialize().await?;
            let outcome = classify(response)?;
            tracing::info!(outcome = ?outcome, "Instance initialization classified");
            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}

/// Map the gateway's `initialize` reply onto an [`InitOutcome`].
pub fn classify(response: InitializeResponse) -> Result<InitOutcome, InitError> {
    let InitializeResponse {
        success,
        state,
        instance_id,
        qr_code,
        pairing_code,
        error,
        message,
    } = response;

    if !success {
        return Ok(InitOutcome::Error(error_message(error, message)));
    }

    let state = state.unwrap_or_default();
    match state.as_str() {
        "needs_phone_number" => Ok(InitOutcome::NeedsPhoneNumber),
        "needs_qr_code" => {
            let instance_id = require_instance(instance_id, &state)?;
            let inline = inline_payload(PairingMethod::QrCode, qr_code, pairing_code);
            Ok(ready_or(instance_id, inline, InitOutcome::NeedsQrCode))
        }
        "needs_pairing_code" => {
            let instance_id = require_instance(instance_id, &state)?;
            let inline = inline_payload(PairingMethod::PairingCode, qr_code, pairing_code);
            Ok(ready_or(instance_id, inline, InitOutcome::NeedsPairingCode))
        }
        // a freshly created instance answers `connecting` with its codes inline
        "is_connecting" | "connecting" => {
            let instance_id = require_instance(instance_id, &state)?;
            let inline = inline_payload(PairingMethod::QrCode, qr_code, pairing_code);
            Ok(ready_or(instance_id, inline, InitOutcome::IsConnecting))
        }
        "already_connected" => Ok(InitOutcome::AlreadyConnected(instance_id)),
        "error" => Ok(InitOutcome::Error(error_message(error, message))),
        other => {
            tracing::warn!(state = %other, "Unknown initialization state");
            Ok(InitOutcome::Error(format!(
                "unexpected initialization state '{}'",
                other
            )))
        }
    }
}

fn ready_or(
    instance_id: InstanceId,
    inline: Option<(PairingMethod, QrPayload)>,
    otherwise: fn(InstanceId) -> InitOutcome,
) -> InitOutcome {
    match inline {
        Some((method, payload)) => InitOutcome::PayloadReady {
            instance_id,
            method,
            payload,
        },
        None => otherwise(instance_id),
    }
}

/// Payload carried by the reply itself, preferring `preferred`.
fn inline_payload(
    preferred: PairingMethod,
    qr_code: Option<String>,
    pairing_code: Option<String>,
) -> Option<(PairingMethod, QrPayload)> {
    let qr_code = qr_code
        .filter(|code| !code.trim().is_empty())
        .map(|code| (PairingMethod::QrCode, code));
    let pairing_code = pairing_code
        .filter(|code| !code.trim().is_empty())
        .map(|code| (PairingMethod::PairingCode, code));

    let found = match preferred {
        PairingMethod::QrCode => qr_code.or(pairing_code),
        PairingMethod::PairingCode => pairing_code.or(qr_code),
    };
    found.map(|(method, code)| (method, QrPayload::new(code)))
}

fn require_instance(instance_id: Option<InstanceId>, state: &str) -> Result<InstanceId, InitError> {
    instance_id.ok_or_else(|| InitError::MissingInstanceId {
        state: state.to_string(),
    })
}

fn error_message(error: Option<String>, message: Option<String>) -> String {
    error
        .or(message)
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_INIT_ERROR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::connection::test_support::MockGateway;
    use wl_core::GatewayError;

    fn reply(state: &str, instance: Option<&str>) -> InitializeResponse {
        InitializeResponse {
            success: true,
            state: Some(state.to_string()),
            instance_id: instance.map(InstanceId::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_known_states() {
        assert_eq!(
            classify(reply("needs_phone_number", None)).unwrap(),
            InitOutcome::NeedsPhoneNumber
        );
        assert_eq!(
            classify(reply("needs_qr_code", Some("inst-1"))).unwrap(),
            InitOutcome::NeedsQrCode(InstanceId::from("inst-1"))
        );
        assert_eq!(
            classify(reply("needs_pairing_code", Some("inst-1"))).unwrap(),
            InitOutcome::NeedsPairingCode(InstanceId::from("inst-1"))
        );
        assert_eq!(
            classify(reply("is_connecting", Some("inst-2"))).unwrap(),
            InitOutcome::IsConnecting(InstanceId::from("inst-2"))
        );
        assert_eq!(
            classify(reply("connecting", Some("inst-2"))).unwrap(),
            InitOutcome::IsConnecting(InstanceId::from("inst-2"))
        );
        assert_eq!(
            classify(reply("already_connected", None)).unwrap(),
            InitOutcome::AlreadyConnected(None)
        );
    }

    #[test]
    fn test_classify_fresh_instance_carries_inline_qr() {
        let response: InitializeResponse = serde_json::from_str(
            r#"{"success":true,"instanceName":"inst-1","qrCode":"data:image/png;base64,AAA","pairingCode":"WZYE-H1YY","state":"connecting"}"#,
        )
        .unwrap();

        assert_eq!(
            classify(response).unwrap(),
            InitOutcome::PayloadReady {
                instance_id: InstanceId::from("inst-1"),
                method: PairingMethod::QrCode,
                payload: QrPayload::from("data:image/png;base64,AAA"),
            }
        );
    }

    #[test]
    fn test_classify_inline_pairing_code() {
        let mut response = reply("needs_pairing_code", Some("inst-1"));
        response.qr_code = Some("data:image/png;base64,AAA".to_string());
        response.pairing_code = Some("WZYE-H1YY".to_string());
        assert_eq!(
            classify(response).unwrap(),
            InitOutcome::PayloadReady {
                instance_id: InstanceId::from("inst-1"),
                method: PairingMethod::PairingCode,
                payload: QrPayload::from("WZYE-H1YY"),
            }
        );

        // only a code available: used even though a QR image was preferred
        let mut response = reply("connecting", Some("inst-1"));
        response.pairing_code = Some("WZYE-H1YY".to_string());
        response.qr_code = Some("  ".to_string());
        assert!(matches!(
            classify(response).unwrap(),
            InitOutcome::PayloadReady { method: PairingMethod::PairingCode, .. }
        ));
    }

    #[test]
    fn test_classify_unsuccessful_reply_uses_gateway_error() {
        let response = InitializeResponse {
            success: false,
            error: Some("Perfil não encontrado".to_string()),
            ..Default::default()
        };
        assert_eq!(
            classify(response).unwrap(),
            InitOutcome::Error("Perfil não encontrado".to_string())
        );

        let response = InitializeResponse {
            success: false,
            ..Default::default()
        };
        assert_eq!(
            classify(response).unwrap(),
            InitOutcome::Error(DEFAULT_INIT_ERROR.to_string())
        );
    }

    #[test]
    fn test_classify_unknown_state_is_error() {
        let outcome = classify(reply("provisioning", Some("inst-1"))).unwrap();
        assert!(matches!(outcome, InitOutcome::Error(message) if message.contains("provisioning")));
    }

    #[test]
    fn test_classify_missing_instance_id() {
        let err = classify(reply("needs_qr_code", None)).unwrap_err();
        assert_eq!(
            err,
            InitError::MissingInstanceId {
                state: "needs_qr_code".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_initialize_surfaces_gateway_failure() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_initialize()
            .times(1)
            .returning(|| Err(GatewayError::Unauthorized("session expired".to_string())));
        let resolver = InitializationResolver::new(Arc::new(gateway));

        let err = resolver.initialize().await.unwrap_err();

        assert!(matches!(err, InitError::Gateway(GatewayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_initialize_classifies_reply() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_initialize()
            .times(1)
            .returning(|| Ok(reply("needs_qr_code", Some("inst-9"))));
        let resolver = InitializationResolver::new(Arc::new(gateway));

        let outcome = resolver.initialize().await.unwrap();

        assert_eq!(outcome, InitOutcome::NeedsQrCode(InstanceId::from("inst-9")));
    }
}
