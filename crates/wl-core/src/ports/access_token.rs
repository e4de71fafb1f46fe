use async_trait::async_trait;

use crate::gateway::GatewayError;

/// Source of the caller's bearer token.
///
/// Error semantics:
/// - Unauthorized : no session, or the session expired and could not be refreshed
#[async_trait]
pub trait AccessTokenPort: Send + Sync {
    async fn access_token(&self) -> Result<String, GatewayError>;
}
