//! Builds the concrete adapters and hands them to the application layer.
//!
//! 装配层:唯一知道具体实现(reqwest 网关、静态令牌)的地方。

use std::sync::Arc;

use anyhow::Context;
use wl_app::ConnectionDeps;
use wl_core::config::AppConfig;
use wl_core::ports::InstanceGatewayPort;
use wl_infra::{StaticAccessToken, SupabaseInstanceGateway};

/// Gateway wired to the configured edge functions.
pub fn build_gateway(config: &AppConfig) -> anyhow::Result<Arc<dyn InstanceGatewayPort>> {
    let tokens = StaticAccessToken::from_config(&config.gateway);
    if !tokens.is_configured() {
        tracing::warn!("No access token configured; gateway calls will be rejected");
    }

    let gateway = SupabaseInstanceGateway::new(&config.gateway, Arc::new(tokens))
        .context("Failed to build instance gateway")?;
    Ok(Arc::new(gateway))
}

pub fn build_connection_deps(config: &AppConfig) -> anyhow::Result<ConnectionDeps> {
    Ok(ConnectionDeps {
        gateway: build_gateway(config)?,
        settings: config.pairing.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_base_url_fails_with_context() {
        let err = build_connection_deps(&AppConfig::default())
            .err()
            .expect("empty base url must be rejected");

        assert!(err.to_string().contains("Failed to build instance gateway"));
    }

    #[test]
    fn test_pairing_settings_are_passed_through() {
        let mut config = AppConfig::default();
        config.gateway.base_url = "https://example.supabase.co/functions/v1".to_string();
        config.pairing.timeout_ms = 12_000;

        let deps = build_connection_deps(&config).unwrap();

        assert_eq!(deps.settings.timeout_ms, 12_000);
    }
}
