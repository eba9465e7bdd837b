//! WalletConnect wire payloads and error taxonomy.

use std::collections::HashMap;

use gangway_core::{Chain, ProtocolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WalletConnect numeric error codes (JSON-RPC range for envelope errors,
/// EIP-1193/WalletConnect range for session errors).
pub mod codes {
    /// Malformed or missing request parameters.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal wallet failure (storage, relay).
    pub const INTERNAL: i64 = -32603;
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// No authorized session for the requesting dApp.
    pub const UNAUTHORIZED: i64 = 4100;
    /// The method is not supported for this session.
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// The session's transport is gone.
    pub const DISCONNECTED: i64 = 4900;
    /// The pairing URI is malformed or its version unsupported.
    pub const INVALID_PAIRING: i64 = 5002;
    /// The proposal requires chains the wallet cannot serve.
    pub const UNSUPPORTED_CHAINS: i64 = 5100;
}

pub(crate) fn invalid_params(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::INVALID_PARAMS, message)
}

pub(crate) fn internal(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::INTERNAL, message)
}

pub(crate) fn user_rejected() -> ProtocolError {
    ProtocolError::new(codes::USER_REJECTED, "user rejected the request")
        .with_display("Request was rejected")
}

pub(crate) fn unauthorized() -> ProtocolError {
    ProtocolError::new(codes::UNAUTHORIZED, "no authorized session for this origin")
}

pub(crate) fn unsupported_method(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::UNSUPPORTED_METHOD, message)
}

pub(crate) fn invalid_pairing(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::INVALID_PAIRING, message)
}

pub(crate) fn unsupported_chains(message: impl Into<String>) -> ProtocolError {
    ProtocolError::new(codes::UNSUPPORTED_CHAINS, message)
}

/// Maps a CAIP namespace key to a wallet chain.
pub(crate) fn chain_for_namespace(key: &str) -> Option<Chain> {
    match key {
        "ton" => Some(Chain::Ton),
        "eip155" => Some(Chain::Ethereum),
        _ => None,
    }
}

/// Namespace key for a wallet chain (inverse of [`chain_for_namespace`]).
pub(crate) fn namespace_for_chain(chain: Chain) -> &'static str {
    match chain {
        Chain::Ton => "ton",
        Chain::Ethereum => "eip155",
    }
}

/// Metadata the proposing dApp presents about itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerMetadata {
    /// dApp name.
    pub name: String,
    /// dApp URL; its origin keys the stored connection.
    pub url: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon URLs, best first.
    #[serde(default)]
    pub icons: Vec<String>,
}

/// One requested namespace in a session proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalNamespace {
    /// CAIP chain ids (e.g. `"eip155:1"`).
    #[serde(default)]
    pub chains: Vec<String>,
    /// RPC methods the dApp wants.
    #[serde(default)]
    pub methods: Vec<String>,
    /// Events the dApp wants.
    #[serde(default)]
    pub events: Vec<String>,
}

/// A session proposal awaiting approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProposal {
    /// Pairing topic the proposal arrived on, when it came over the relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_topic: Option<String>,
    /// Proposer metadata.
    pub proposer: PeerMetadata,
    /// Namespaces the session must serve.
    pub required_namespaces: HashMap<String, ProposalNamespace>,
}

/// Parameters of the `connect` RPC method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    /// Approved account, or `None` when the user rejected the proposal.
    #[serde(default)]
    pub account_id: Option<String>,
    /// The proposal being approved.
    pub proposal: SessionProposal,
}

/// Parameters of the `reconnect` RPC method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectParams {
    /// Account to restore the session for.
    pub account_id: String,
}

/// Parameters shared by `disconnect` and `deactivate`.
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
    /// CAIP namespace key selecting the chain; defaults to the session's
    /// first chain.
    #[serde(default)]
    pub chain: Option<String>,
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
    /// CAIP namespace key selecting the chain; defaults to the session's
    /// first chain.
    #[serde(default)]
    pub chain: Option<String>,
    /// Opaque payload, forwarded to the chain SDK.
    pub payload: Value,
}
