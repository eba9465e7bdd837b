//! Adapter configuration and the chain-capability collaborator interface.
//!
//! A single [`DappProtocolConfig`] is constructed by the process bootstrap
//! and shared read-only (by `Arc`) across all adapters at init time. It
//! carries the update-emission callback to the UI layer, the runtime
//! environment descriptor, the per-chain capability map, and the session
//! storage handle.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection::{ChainSession, DappConnectionStore, DappMetadata};
use crate::error::ProtocolResult;
use crate::protocol::DappProtocolType;

// =============================================================================
// Chains
// =============================================================================

/// Blockchains the wallet can expose to dApps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Chain {
    /// TON.
    Ton,
    /// Ethereum and EVM-compatible networks.
    Ethereum,
}

impl Chain {
    /// Stable identifier used in capability maps and session records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ton => "ton",
            Self::Ethereum => "ethereum",
        }
    }

    /// Resolves a chain identifier string.
    pub fn from_str_id(id: &str) -> Option<Self> {
        match id {
            "ton" => Some(Self::Ton),
            "ethereum" => Some(Self::Ethereum),
            _ => None,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Chain Capability
// =============================================================================

/// Chain SDK surface the adapters call into.
///
/// Transaction building and signing for a specific blockchain live behind
/// this trait; adapters forward payloads through it untouched and propagate
/// its errors unmodified.
#[async_trait]
pub trait ChainDappSdk: Send + Sync {
    /// Resolves the session tuple (address, network, public key) a dApp
    /// connection exposes for the given account.
    async fn account_session(&self, account_id: &str) -> ProtocolResult<ChainSession>;

    /// Builds an unsigned transaction for later confirmation.
    async fn prepare_transaction(&self, account_id: &str, payload: &Value) -> ProtocolResult<Value>;

    /// Signs and submits a dApp-requested transaction.
    async fn send_transaction(&self, account_id: &str, payload: &Value) -> ProtocolResult<Value>;

    /// Signs arbitrary dApp-supplied data.
    async fn sign_data(&self, account_id: &str, payload: &Value) -> ProtocolResult<Value>;
}

/// Dapp-capability descriptor for one chain.
///
/// The bootstrap builds the capability map by filtering the wallet's chain
/// registry down to chains that declare dApp support.
#[derive(Clone)]
pub struct ChainDappSupport {
    /// The chain this descriptor covers.
    pub chain: Chain,
    /// Whether the chain SDK supports arbitrary data signing.
    pub supports_sign_data: bool,
    /// Handle to the chain SDK.
    pub sdk: Arc<dyn ChainDappSdk>,
}

impl ChainDappSupport {
    /// Creates a descriptor with data signing enabled.
    pub fn new(chain: Chain, sdk: Arc<dyn ChainDappSdk>) -> Self {
        Self {
            chain,
            supports_sign_data: true,
            sdk,
        }
    }

    /// Disables data signing for this chain.
    pub fn without_sign_data(mut self) -> Self {
        self.supports_sign_data = false;
        self
    }
}

impl fmt::Debug for ChainDappSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainDappSupport")
            .field("chain", &self.chain)
            .field("supports_sign_data", &self.supports_sign_data)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Runtime Environment
// =============================================================================

/// Runtime/environment descriptor shared with adapters.
///
/// Protocols echo parts of this back to dApps as device info.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeEnv {
    /// Platform tag (e.g. `"ios"`, `"android"`, `"chrome-extension"`).
    pub platform: String,
    /// Wallet application name.
    pub app_name: String,
    /// Wallet application version.
    pub app_version: String,
    /// Whether the wallet runs as a browser extension.
    pub is_extension: bool,
}

impl Default for RuntimeEnv {
    fn default() -> Self {
        Self {
            platform: "unknown".to_owned(),
            app_name: "Gangway".to_owned(),
            app_version: env!("CARGO_PKG_VERSION").to_owned(),
            is_extension: false,
        }
    }
}

// =============================================================================
// Updates
// =============================================================================

/// Update events pushed to the UI layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DappUpdate {
    /// A dApp asked to connect (deep link or relay pairing); the UI should
    /// start an approval flow that ends in a `connect` RPC call.
    #[serde(rename_all = "camelCase")]
    DappConnectRequest {
        /// Protocol the request arrived on.
        protocol: DappProtocolType,
        /// Origin of the requesting dApp, when already known.
        #[serde(skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
        /// Request correlation id from the deep link, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// A connection handshake completed.
    #[serde(rename_all = "camelCase")]
    DappConnect {
        /// Account the dApp connected to.
        account_id: String,
        /// Remote dApp metadata.
        dapp: DappMetadata,
    },

    /// A connection was closed and its record removed.
    #[serde(rename_all = "camelCase")]
    DappDisconnect {
        /// Account the dApp was connected to.
        account_id: String,
        /// Origin of the disconnected dApp.
        origin: String,
    },
}

/// Update-emission callback to the UI layer.
pub type UpdateSink = Arc<dyn Fn(DappUpdate) + Send + Sync>;

// =============================================================================
// Adapter Configuration
// =============================================================================

/// Immutable configuration handed to every adapter at init time.
pub struct DappProtocolConfig {
    /// Update-emission callback.
    pub on_update: UpdateSink,
    /// Runtime environment descriptor.
    pub env: RuntimeEnv,
    /// Per-chain dApp capability map.
    pub chain_dapp_supports: HashMap<Chain, ChainDappSupport>,
    /// Session storage collaborator. Adapters are the only writers.
    pub store: Arc<dyn DappConnectionStore>,
}

impl DappProtocolConfig {
    /// Looks up the capability descriptor for a chain.
    pub fn chain_support(&self, chain: Chain) -> Option<&ChainDappSupport> {
        self.chain_dapp_supports.get(&chain)
    }

    /// Emits an update to the UI layer.
    pub fn emit(&self, update: DappUpdate) {
        (self.on_update)(update);
    }
}

impl fmt::Debug for DappProtocolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DappProtocolConfig")
            .field("env", &self.env)
            .field("chains", &self.chain_dapp_supports.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
