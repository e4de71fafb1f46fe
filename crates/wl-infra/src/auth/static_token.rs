use async_trait::async_trait;

use wl_core::config::GatewayConfig;
use wl_core::gateway::GatewayError;
use wl_core::ports::AccessTokenPort;

/// Environment variable overriding `gateway.access_token`.
pub const ACCESS_TOKEN_ENV: &str = "WALINK_ACCESS_TOKEN";

/// Access token fixed at startup.
///
/// No refresh: an expired token surfaces as `Unauthorized` from the gateway.
#[derive(Clone)]
pub struct StaticAccessToken {
    token: Option<String>,
}

impl StaticAccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Resolve the token from the environment, falling back to the config file.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::from_sources(
            std::env::var(ACCESS_TOKEN_ENV).ok(),
            config.access_token.clone(),
        )
    }

    pub(crate) fn from_sources(env: Option<String>, configured: Option<String>) -> Self {
        let token = env
            .filter(|value| !value.trim().is_empty())
            .or(configured.filter(|value| !value.trim().is_empty()))
            .map(|value| value.trim().to_string());
        Self { token }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

impl std::fmt::Debug for StaticAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticAccessToken")
            .field("configured", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl AccessTokenPort for StaticAccessToken {
    async fn access_token(&self) -> Result<String, GatewayError> {
        self.token.clone().ok_or_else(|| {
            GatewayError::Unauthorized(format!(
                "no access token configured; set gateway.access_token or {}",
                ACCESS_TOKEN_ENV
            ))
        })
    }
}
