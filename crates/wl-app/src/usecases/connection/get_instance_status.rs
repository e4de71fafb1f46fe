use std::sync::Arc;

use wl_core::gateway::{GatewayError, StatusResponse};
use wl_core::ports::InstanceGatewayPort;
use wl_core::InstanceId;

/// One-off status read, outside any polling session.
pub struct GetInstanceStatus {
    gateway: Arc<dyn InstanceGatewayPort>,
}

impl GetInstanceStatus {
    pub fn new(gateway: Arc<dyn InstanceGatewayPort>) -> Self {
        Self { gateway }
    }

    pub async fn execute(&self, instance_id: &InstanceId) -> Result<StatusResponse, GatewayError> {
        self.gateway.get_status(instance_id).await
    }
}
