use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use wl_core::config::GatewayConfig;
use wl_core::gateway::{
    AckResponse, GatewayError, InitializeResponse, QrCodeResponse, StatusResponse,
};
use wl_core::ports::{AccessTokenPort, InstanceGatewayPort};
use wl_core::InstanceId;

use super::qr::normalize_qr_payload;

const API_HANDLER: &str = "evolution-api-handler";
const GENERATE_QR: &str = "evolution-generate-qr";
const RESTART_INSTANCE: &str = "evolution-restart-instance";

/// Longest body excerpt carried in an error message
const BODY_EXCERPT: usize = 200;

/// Instance gateway backed by Supabase edge functions.
///
/// Every call is a `POST {base_url}/{function}` with the user's bearer token
/// and the project's anon key.
pub struct SupabaseInstanceGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: Option<String>,
    tokens: Arc<dyn AccessTokenPort>,
}

impl SupabaseInstanceGateway {
    pub fn new(
        config: &GatewayConfig,
        tokens: Arc<dyn AccessTokenPort>,
    ) -> Result<Self, GatewayError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GatewayError::Configuration(
                "gateway.base_url is not set".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            anon_key: config
                .anon_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            tokens,
        })
    }

    async fn call<T: DeserializeOwned>(&self, function: &str, body: Value) -> Result<T, GatewayError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/{}", self.base_url, function);

        let mut request = self.client.post(&url).bearer_auth(token).json(&body);
        if let Some(key) = &self.anon_key {
            request = request.header("apikey", key);
        }

        tracing::debug!(function = %function, "Calling gateway");
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GatewayError::Unauthorized(
                    envelope_error(&text).unwrap_or_else(|| status.to_string()),
                ));
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(GatewayError::RateLimited),
            _ => {}
        }

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                GatewayError::Decode(format!("{}: {}", function, e))
            });
        }

        // edge functions answer errors with the same envelope, just a non-2xx status
        match serde_json::from_str::<Value>(&text) {
            Ok(value) if is_envelope(&value) => {
                tracing::debug!(function = %function, status = %status, "Gateway returned error envelope");
                serde_json::from_value(value)
                    .map_err(|e| GatewayError::Decode(format!("{}: {}", function, e)))
            }
            _ => Err(GatewayError::Transport(format!(
                "{} returned {}: {}",
                function,
                status,
                excerpt(&text)
            ))),
        }
    }
}

#[async_trait]
impl InstanceGatewayPort for SupabaseInstanceGateway {
    async fn initialize(&self) -> Result<InitializeResponse, GatewayError> {
        let mut response: InitializeResponse = self
            .call(API_HANDLER, json!({ "action": "initialize-connection" }))
            .await?;
        response.qr_code = response.qr_code.map(|code| normalize_qr_payload(&code));
        Ok(response)
    }

    async fn fetch_qr(&self, instance_id: &InstanceId) -> Result<QrCodeResponse, GatewayError> {
        let mut response: QrCodeResponse = self
            .call(GENERATE_QR, json!({ "instanceName": instance_id }))
            .await?;
        response.qr_code = response.qr_code.map(|code| normalize_qr_payload(&code));
        Ok(response)
    }

    async fn fetch_pairing_code(
        &self,
        instance_id: &InstanceId,
    ) -> Result<QrCodeResponse, GatewayError> {
        self.call(
            API_HANDLER,
            json!({ "action": "generate-pairing-code", "instanceName": instance_id }),
        )
        .await
    }

    async fn get_status(&self, instance_id: &InstanceId) -> Result<StatusResponse, GatewayError> {
        self.call(
            API_HANDLER,
            json!({ "action": "get-status", "instanceName": instance_id }),
        )
        .await
    }

    async fn restart(&self, instance_id: &InstanceId) -> Result<AckResponse, GatewayError> {
        self.call(RESTART_INSTANCE, json!({ "instanceName": instance_id }))
            .await
    }

    async fn logout(&self, instance_id: &InstanceId) -> Result<AckResponse, GatewayError> {
        self.call(
            API_HANDLER,
            json!({ "action": "logout", "instanceName": instance_id }),
        )
        .await
    }
}

fn map_reqwest_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Transport("request timed out".to_string())
    } else if error.is_builder() {
        GatewayError::Configuration(error.to_string())
    } else if error.is_decode() {
        GatewayError::Decode(error.to_string())
    } else {
        GatewayError::Transport(error.to_string())
    }
}

fn is_envelope(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key("success") || object.contains_key("error"))
}

fn envelope_error(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    ["error", "msg", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

fn excerpt(text: &str) -> String {
    text.chars().take(BODY_EXCERPT).collect()
}
