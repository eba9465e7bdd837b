//! TonConnect wire payloads and error taxonomy.

use gangway_core::{ProtocolError, RuntimeEnv};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// TonConnect numeric error codes.
pub mod codes {
    /// Unspecified failure.
    pub const UNKNOWN: i64 = 0;
    /// Malformed or missing request parameters.
    pub const BAD_REQUEST: i64 = 1;
    /// Manifest was fetched but its content is invalid.
    pub const MANIFEST_CONTENT_ERROR: i64 = 3;
    /// No stored connection for the requesting dApp.
    pub const UNKNOWN_APP: i64 = 100;
    /// The user declined the request.
    pub const USER_DECLINED: i64 = 300;
    /// The method is not supported for this account/chain.
    pub const METHOD_NOT_SUPPORTED: i64 = 400;
}

pub(crate) fn unknown(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::UNKNOWN, message)
}

pub(crate) fn bad_request(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::BAD_REQUEST, message)
}

pub(crate) fn manifest_error(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::MANIFEST_CONTENT_ERROR, message)
}

pub(crate) fn unknown_app() -> ProtocolError {
    ProtocolError::new(codes::UNKNOWN_APP, "unknown app: no stored connection for this origin")
}

pub(crate) fn user_declined() -> ProtocolError {
    ProtocolError::new(codes::USER_DECLINED, "user declined the request")
        .with_display("Request was declined")
}

pub(crate) fn method_not_supported(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::METHOD_NOT_SUPPORTED, message)
}

/// dApp manifest content, fetched and resolved by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DappManifest {
    /// dApp URL; its origin keys the stored connection.
    pub url: String,
    /// Display name.
    pub name: String,
    /// Icon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl DappManifest {
    pub(crate) fn validate(&self) -> Result<(), ProtocolError> {
        if self.url.trim().is_empty() {
            return Err(manifest_error("manifest url is empty"));
        }
        if self.name.trim().is_empty() {
            return Err(manifest_error("manifest name is empty"));
        }
        Ok(())
    }
}

/// One item the dApp asks for in a connect request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ConnectItemRequest {
    /// Wallet address and network.
    TonAddr,
    /// Ownership proof over a dApp-supplied payload.
    TonProof {
        /// Challenge payload to sign.
        payload: String,
    },
}

/// Connect request payload, manifest already resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequestPayload {
    /// Resolved manifest content.
    pub manifest: DappManifest,
    /// Requested reply items.
    #[serde(default)]
    pub items: Vec<ConnectItemRequest>,
}

/// Parameters of the `connect` RPC method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    /// Approved account, or `None` when the user declined.
    #[serde(default)]
    pub account_id: Option<String>,
    /// The connect request being approved.
    pub request: ConnectRequestPayload,
    /// Bridge client id of the requesting dApp, when the request arrived
    /// over the bridge (deep link / QR flow).
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Parameters of the `reconnect` RPC method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectParams {
    /// Account to restore the session for.
    pub account_id: String,
}

/// Parameters shared by `disconnect`, `deactivate` and the signing methods.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    /// Account the session belongs to.
    pub account_id: String,
    /// dApp origin; falls back to the request's verified origin.
    #[serde(default)]
    pub origin: Option<String>,
}

/// Parameters of the `sendTransaction` RPC method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionParams {
    /// Account the session belongs to.
    pub account_id: String,
    /// dApp origin; falls back to the request's verified origin.
    #[serde(default)]
    pub origin: Option<String>,
    /// Opaque transaction payload, forwarded to the chain SDK.
    pub transaction: Value,
}

/// Parameters of the `signData` RPC method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignDataParams {
    /// Account the session belongs to.
    pub account_id: String,
    /// dApp origin; falls back to the request's verified origin.
    #[serde(default)]
    pub origin: Option<String>,
    /// Opaque payload, forwarded to the chain SDK.
    pub payload: Value,
}

/// Device info echoed to the dApp in connect replies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Platform tag.
    pub platform: String,
    /// Wallet application name.
    pub app_name: String,
    /// Wallet application version.
    pub app_version: String,
    /// Highest supported protocol version.
    pub max_protocol_version: u32,
    /// Supported feature names.
    pub features: Vec<&'static str>,
}

impl DeviceInfo {
    pub(crate) fn from_env(env: &RuntimeEnv) -> Self {
        Self {
            platform: env.platform.clone(),
            app_name: env.app_name.clone(),
            app_version: env.app_version.clone(),
            max_protocol_version: 2,
            features: vec!["SendTransaction", "SignData"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connect_items_use_tonconnect_naming() {
        let items: Vec<ConnectItemRequest> = serde_json::from_value(json!([
            {"name": "ton_addr"},
            {"name": "ton_proof", "payload": "challenge"},
        ]))
        .unwrap();
        assert!(matches!(items[0], ConnectItemRequest::TonAddr));
        assert!(matches!(items[1], ConnectItemRequest::TonProof { ref payload } if payload == "challenge"));
    }

    #[test]
    fn empty_manifest_fields_are_content_errors() {
        let manifest = DappManifest {
            url: " ".to_owned(),
            name: "App".to_owned(),
            icon_url: None,
        };
        let err = manifest.validate().unwrap_err();
        assert_eq!(err.code, codes::MANIFEST_CONTENT_ERROR);
    }
}
