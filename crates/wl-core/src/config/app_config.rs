//! Application configuration domain model

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::settings::PairingSettings;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 20_000;

/// Application configuration
///
/// Every section is optional in the file; missing sections and keys take the
/// `Default` values below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote instance gateway endpoint
    pub gateway: GatewayConfig,

    /// Poll cadence, timeout and restart grace
    pub pairing: PairingSettings,

    /// Log filter and optional log directory
    pub logging: LoggingConfig,
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the edge functions, e.g. `https://<project>.supabase.co/functions/v1`
    pub base_url: String,

    /// Public API key sent as the `apikey` header
    pub anon_key: Option<String>,

    /// Bearer token of the signed-in user
    pub access_token: Option<String>,

    /// Per-request timeout
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            anon_key: None,
            access_token: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Directory for rolling log files; stdout only when absent
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
