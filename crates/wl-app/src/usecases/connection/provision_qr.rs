use std::sync::Arc;

use tracing::{info_span, Instrument};
use wl_core::ports::InstanceGatewayPort;
use wl_core::{InstanceId, PairingMethod, Provisioned, QrError, QrPayload};

const DEFAULT_QR_ERROR: &str = "failed to generate a QR code";

/// Fetches a fresh pairing payload for an instance.
pub struct QrProvisioner {
    gateway: Arc<dyn InstanceGatewayPort>,
}

impl QrProvisioner {
    pub fn new(gateway: Arc<dyn InstanceGatewayPort>) -> Self {
        Self { gateway }
    }

    /// Fetch a QR image or a pairing code, depending on `method`.
    pub async fn provision(
        &self,
        instance_id: &InstanceId,
        method: PairingMethod,
    ) -> Result<Provisioned, QrError> {
        let span = info_span!("connection.fetch_qr", instance_id = %instance_id, method = ?method);
        async {
            let response = match method {
                PairingMethod::QrCode => self.gateway.fetch_qr(instance_id).await?,
                PairingMethod::PairingCode => self.gateway.fetch_pairing_code(instance_id).await?,
            };

            // the gateway answers success=false together with alreadyConnected
            if response.already_connected {
                tracing::info!("Instance already connected, no QR code needed");
                return Ok(Provisioned::AlreadyConnected);
            }
            if response.instance_not_found {
                return Err(QrError::InstanceNotFound(instance_id.clone()));
            }
            if !response.success {
                let message = response
                    .error
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_QR_ERROR.to_string());
                return Err(QrError::Rejected(message));
            }

            let (code, missing) = match method {
                PairingMethod::QrCode => (response.qr_code, "gateway returned no QR code"),
                PairingMethod::PairingCode => {
                    (response.pairing_code, "gateway returned no pairing code")
                }
            };
            match code.filter(|code| !code.trim().is_empty()) {
                Some(code) => {
                    tracing::info!(code_len = code.len(), "Pairing payload received");
                    Ok(Provisioned::Qr(QrPayload::new(code)))
                }
                None => Err(QrError::Rejected(missing.to_string())),
            }
        }
        .instrument(span)
        .await
    }
}
