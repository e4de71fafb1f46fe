use std::sync::Arc;
use std::time::Duration;

use tracing::{info_span, Instrument};
use wl_core::ports::InstanceGatewayPort;
use wl_core::{InstanceId, PairingMethod, Provisioned, RestartError};

use super::provision_qr::QrProvisioner;

const DEFAULT_RESTART_ERROR: &str = "failed to restart the instance";

/// Recovers a stuck pairing attempt: remote restart, grace wait, new QR code.
///
/// Exactly one attempt per call; failures are returned to the orchestrator,
/// which decides what happens next.
pub struct RestartCoordinator {
    gateway: Arc<dyn InstanceGatewayPort>,
    provisioner: Arc<QrProvisioner>,
    grace: Duration,
}

impl RestartCoordinator {
    pub fn new(
        gateway: Arc<dyn InstanceGatewayPort>,
        provisioner: Arc<QrProvisioner>,
        grace: Duration,
    ) -> Self {
        Self {
            gateway,
            provisioner,
            grace,
        }
    }

    /// The refetch after the grace wait asks for the same kind of payload as
    /// the attempt being recovered.
    pub async fn restart(
        &self,
        instance_id: &InstanceId,
        method: PairingMethod,
    ) -> Result<Provisioned, RestartError> {
        let span = info_span!("connection.restart", instance_id = %instance_id);
        async {
            let ack = self.gateway.restart(instance_id).await?;
            if !ack.success {
                let message = ack
                    .error
                    .or(ack.message)
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_RESTART_ERROR.to_string());
                tracing::error!(error = %message, "Instance restart rejected");
                return Err(RestartError::Rejected(message));
            }

            tracing::info!(
                grace_ms = self.grace.as_millis() as u64,
                "Instance restarted, waiting before requesting a new payload"
            );
            tokio::time::sleep(self.grace).await;

            Ok(self.provisioner.provision(instance_id, method).await?)
        }
        .instrument(span)
        .await
    }
}
