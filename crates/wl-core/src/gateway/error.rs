use thiserror::Error;

/// Failure to obtain a usable answer from the gateway.
///
/// A reply with `success: false` is not a `GatewayError`; it is decoded into
/// the response type and classified by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("gateway misconfigured: {0}")]
    Configuration(String),

    #[error("authentication failed: {0}")]
    Unauthorized(String),

    #[error("too many requests, try again in a few minutes")]
    RateLimited,

    #[error("gateway request failed: {0}")]
    Transport(String),

    #[error("malformed gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Transient errors are worth another poll tick; the rest need a human.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RateLimited)
    }
}
