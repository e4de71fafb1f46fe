use async_trait::async_trait;

use crate::gateway::{
    AckResponse, GatewayError, InitializeResponse, QrCodeResponse, StatusResponse,
};
use crate::ids::InstanceId;

/// Remote instance gateway
///
/// Every call is an authenticated request/response round trip. Implementations
/// return `Ok` whenever the gateway produced a decodable reply, including
/// replies with `success: false`.
#[async_trait]
pub trait InstanceGatewayPort: Send + Sync {
    /// Discover (and create if needed) the caller's instance.
    async fn initialize(&self) -> Result<InitializeResponse, GatewayError>;

    /// Ask the instance for a fresh QR image.
    async fn fetch_qr(&self, instance_id: &InstanceId) -> Result<QrCodeResponse, GatewayError>;

    /// Ask the instance for a pairing code to type on the phone.
    async fn fetch_pairing_code(
        &self,
        instance_id: &InstanceId,
    ) -> Result<QrCodeResponse, GatewayError>;

    /// Read the instance's connection status.
    async fn get_status(&self, instance_id: &InstanceId)
        -> Result<StatusResponse, GatewayError>;

    /// Restart the instance so it can produce a new QR code.
    async fn restart(&self, instance_id: &InstanceId) -> Result<AckResponse, GatewayError>;

    /// Unlink the device from the instance.
    async fn logout(&self, instance_id: &InstanceId) -> Result<AckResponse, GatewayError>;
}
