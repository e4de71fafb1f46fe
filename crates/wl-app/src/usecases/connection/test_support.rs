//! Mock gateway shared by the connection unit tests.

use async_trait::async_trait;
use mockall::mock;

use wl_core::gateway::{AckResponse, GatewayError, InitializeResponse, QrCodeResponse, StatusResponse};
use wl_core::ports::InstanceGatewayPort;
use wl_core::InstanceId;

mock! {
    pub Gateway {}

    #[async_trait]
    impl InstanceGatewayPort for Gateway {
        async fn initialize(&self) -> Result<InitializeResponse, GatewayError>;
        async fn fetch_qr(&self, instance_id: &InstanceId) -> Result<QrCodeResponse, GatewayError>;
        async fn fetch_pairing_code(&self, instance_id: &InstanceId)
            -> Result<QrCodeResponse, GatewayError>;
        async fn get_status(&self, instance_id: &InstanceId)
            -> Result<StatusResponse, GatewayError>;
        async fn restart(&self, instance_id: &InstanceId) -> Result<AckResponse, GatewayError>;
        async fn logout(&self, instance_id: &InstanceId) -> Result<AckResponse, GatewayError>;
    }
}

pub(crate) fn status(value: &str) -> StatusResponse {
    StatusResponse {
        success: true,
        status: Some(value.to_string()),
        error: None,
    }
}

pub(crate) fn ack(success: bool, error: Option<&str>) -> AckResponse {
    AckResponse {
        success,
        error: error.map(str::to_string),
        message: None,
    }
}

pub(crate) fn qr_code(code: &str) -> QrCodeResponse {
    QrCodeResponse {
        success: true,
        qr_code: Some(code.to_string()),
        ..Default::default()
    }
}

pub(crate) fn pairing_code(code: &str) -> QrCodeResponse {
    QrCodeResponse {
        success: true,
        pairing_code: Some(code.to_string()),
        ..Default::default()
    }
}
