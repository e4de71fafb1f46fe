pub mod disconnect_instance;
pub mod events;
pub mod facade;
pub mod get_instance_status;
pub mod initialization_resolver;
pub mod orchestrator;
pub mod provision_qr;
pub mod restart_coordinator;
pub mod status_poller;

#[cfg(test)]
pub(crate) mod test_support;

pub use disconnect_instance::DisconnectInstance;
pub use events::{ConnectionDomainEvent, ConnectionEventPort};
pub use facade::ConnectionFacade;
pub use get_instance_status::GetInstanceStatus;
pub use initialization_resolver::InitializationResolver;
pub use orchestrator::ConnectionOrchestrator;
pub use provision_qr::QrProvisioner;
pub use restart_coordinator::RestartCoordinator;
pub use status_poller::{PollingSession, StatusPoller};
