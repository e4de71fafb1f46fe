use std::sync::Arc;

use tracing::{info_span, Instrument};
use wl_core::ports::InstanceGatewayPort;
use wl_core::{DisconnectError, InstanceId};

/// Unlinks the device from an instance.
///
/// Local state is the caller's business: the orchestrator clears it before
/// this call completes, whatever the outcome.
pub struct DisconnectInstance {
    gateway: Arc<dyn InstanceGatewayPort>,
}

impl DisconnectInstance {
    pub fn new(gateway: Arc<dyn InstanceGatewayPort>) -> Self {
        Self { gateway }
    }

    pub async fn execute(&self, instance_id: &InstanceId) -> Result<(), DisconnectError> {
        let span = info_span!("connection.logout", instance_id = %instance_id);
        async {
            let ack = self.gateway.logout(instance_id).await?;
            if !ack.success {
                let message = ack
                    .error
                    .or(ack.message)
                    .unwrap_or_else(|| "failed to disconnect the instance".to_string());
                return Err(DisconnectError::Rejected(message));
            }
            tracing::info!("Instance logged out");
            Ok(())
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::connection::test_support::{ack, MockGateway};

    #[tokio::test]
    async fn test_logout_success() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_logout()
            .withf(|id| id.as_str() == "inst-1")
            .times(1)
            .returning(|_| Ok(ack(true, None)));

        let result = DisconnectInstance::new(Arc::new(gateway))
            .execute(&InstanceId::from("inst-1"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_logout_rejected() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_logout()
            .times(1)
            .returning(|_| Ok(ack(false, Some("not connected"))));

        let err = DisconnectInstance::new(Arc::new(gateway))
            .execute(&InstanceId::from("inst-1"))
            .await
            .unwrap_err();

        assert_eq!(err, DisconnectError::Rejected("not connected".to_string()));
    }
}
