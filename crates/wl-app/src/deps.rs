//! # Connection Dependencies / 连接依赖
//!
//! Parameter grouping for [`ConnectionOrchestrator`](crate::ConnectionOrchestrator)
//! construction. Not a builder: no defaults, no hidden logic.

use std::sync::Arc;

use wl_core::ports::InstanceGatewayPort;
use wl_core::PairingSettings;

/// Everything the connection orchestrator needs from the outside world.
pub struct ConnectionDeps {
    pub gateway: Arc<dyn InstanceGatewayPort>,
    pub settings: PairingSettings,
}
