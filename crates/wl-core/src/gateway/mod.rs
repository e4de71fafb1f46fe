//! Remote instance gateway contract
//!
//! Request/response shapes of the five gateway operations and the error type
//! shared by every gateway adapter.

pub mod contract;
pub mod error;

pub use contract::{AckResponse, InitializeResponse, QrCodeResponse, StatusResponse};
pub use error::GatewayError;
