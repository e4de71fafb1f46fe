use serde::{Deserialize, Serialize};

use crate::ids::InstanceId;

/// Reply of `initialize`.
///
/// `state` is one of `needs_phone_number`, `needs_qr_code`, `is_connecting`,
/// `already_connected` or `error`; older deployments also answer
/// `needs_pairing_code` and `connecting`. A freshly created instance answers
/// `connecting` with the pairing payload inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(
        default,
        rename = "instanceName",
        alias = "instanceId",
        skip_serializing_if = "Option::is_none"
    )]
    pub instance_id: Option<InstanceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Reply of `fetchQr` and `fetchPairingCode`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub already_connected: bool,

    #[serde(default)]
    pub instance_not_found: bool,
}

/// Reply of `getStatus`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    /// Only a successful reply whose status reads "open" counts as connected.
    pub fn is_open(&self) -> bool {
        self.success
            && self
                .status
                .as_deref()
                .is_some_and(|status| status.eq_ignore_ascii_case("open"))
    }
}

/// Reply of `restart` and `logout`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_response_reads_instance_name() {
        let response: InitializeResponse = serde_json::from_str(
            r#"{"success":true,"state":"needs_qr_code","instanceName":"inst-1"}"#,
        )
        .unwrap();
        assert!(response.success);
        assert_eq!(response.state.as_deref(), Some("needs_qr_code"));
        assert_eq!(response.instance_id, Some(InstanceId::from("inst-1")));
    }

    #[test]
    fn test_initialize_response_accepts_instance_id_alias() {
        let response: InitializeResponse =
            serde_json::from_str(r#"{"success":true,"state":"is_connecting","instanceId":"inst-2"}"#)
                .unwrap();
        assert_eq!(response.instance_id, Some(InstanceId::from("inst-2")));
    }

    #[test]
    fn test_initialize_response_reads_inline_codes() {
        let response: InitializeResponse = serde_json::from_str(
            r#"{"success":true,"instanceName":"inst-1","qrCode":"data:image/png;base64,AAA","pairingCode":"WZYE-H1YY","state":"connecting"}"#,
        )
        .unwrap();
        assert_eq!(response.qr_code.as_deref(), Some("data:image/png;base64,AAA"));
        assert_eq!(response.pairing_code.as_deref(), Some("WZYE-H1YY"));
    }

    #[test]
    fn test_qr_response_flags_default_to_false() {
        let response: QrCodeResponse =
            serde_json::from_str(r#"{"success":true,"qrCode":"data:image/png;base64,AAA"}"#)
                .unwrap();
        assert!(!response.already_connected);
        assert!(!response.instance_not_found);

        let response: QrCodeResponse = serde_json::from_str(
            r#"{"success":false,"error":"Instance is already connected.","alreadyConnected":true}"#,
        )
        .unwrap();
        assert!(response.already_connected);
    }

    #[test]
    fn test_status_open_is_case_insensitive() {
        for status in ["OPEN", "open", "Open"] {
            let response = StatusResponse {
                success: true,
                status: Some(status.to_string()),
                error: None,
            };
            assert!(response.is_open(), "{status} should count as open");
        }
    }

    #[test]
    fn test_status_other_values_are_not_open() {
        let close = StatusResponse {
            success: true,
            status: Some("close".to_string()),
            error: None,
        };
        let missing = StatusResponse {
            success: true,
            status: None,
            error: None,
        };
        let failed = StatusResponse {
            success: false,
            status: Some("open".to_string()),
            error: Some("boom".to_string()),
        };
        assert!(!close.is_open());
        assert!(!missing.is_open());
        assert!(!failed.is_open());
    }
}
