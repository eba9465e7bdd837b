//! The dApp protocol adapter contract.
//!
//! One implementation exists per supported protocol. The manager owns exactly
//! one instance of each for the process lifetime and is the only component
//! that calls the lifecycle methods.
//!
//! # Failure semantics
//!
//! RPC-shaped calls ([`DappProtocolAdapter::call`], `handle_deep_link`,
//! `close_remote_connection`) fail with a [`ProtocolError`] that propagates
//! unmodified to the original caller. Lifecycle calls (`init`, `destroy`,
//! the optional resetup hook) fail with an [`AdapterError`](crate::error::AdapterError)
//! that the manager catches and logs, so one broken protocol cannot block
//! the others from initializing or a shutdown from completing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::DappProtocolConfig;
use crate::connection::StoredDappConnection;
use crate::error::{AdapterResult, ProtocolResult};
use crate::protocol::DappProtocolType;
use crate::request::ApiDappRequest;
use crate::routing::AdapterMethod;

/// A deep link handed off from an external context (browser, QR code,
/// another app) into the wallet.
#[derive(Debug, Clone)]
pub struct DeepLink {
    /// The full link URL.
    pub url: String,
    /// Whether the link was opened from the wallet's in-app browser.
    pub from_in_app_browser: bool,
    /// Correlation id for the UI flow the link belongs to, if any.
    pub request_id: Option<String>,
}

impl DeepLink {
    /// Creates a deep link from an external context.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            from_in_app_browser: false,
            request_id: None,
        }
    }

    /// Marks the link as opened from the in-app browser.
    pub fn from_in_app_browser(mut self) -> Self {
        self.from_in_app_browser = true;
        self
    }

    /// Attaches a request correlation id.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// The dApp protocol adapter contract.
#[async_trait]
pub trait DappProtocolAdapter: Send + Sync {
    /// Constant protocol identity.
    fn protocol_type(&self) -> DappProtocolType;

    /// Establishes the persistent resources the protocol needs (relay
    /// subscriptions, bridge session listeners).
    ///
    /// Idempotent on success: a second call after a successful one is a
    /// no-op. On failure the manager leaves the registration uninitialized.
    async fn init(&self, config: Arc<DappProtocolConfig>) -> AdapterResult<()>;

    /// Releases all resources. After this resolves, `init` may be called
    /// again to restart the adapter.
    async fn destroy(&self) -> AdapterResult<()>;

    /// Whether this adapter claims the given deep link.
    ///
    /// Pure predicate: must not mutate state and must not panic — malformed
    /// URLs yield `false`.
    fn can_handle_deep_link(&self, url: &str) -> bool;

    /// Processes a claimed deep link; invoked only after
    /// [`can_handle_deep_link`](Self::can_handle_deep_link) returned `true`
    /// for the same URL. Returns an optional redirect/result URL.
    async fn handle_deep_link(&self, link: &DeepLink) -> ProtocolResult<Option<String>>;

    /// Terminates one stored session's live transport, if any. Deleting the
    /// stored record is the caller's responsibility.
    async fn close_remote_connection(
        &self,
        account_id: &str,
        connection: &StoredDappConnection,
    ) -> ProtocolResult<()>;

    /// Invokes one of the protocol's RPC-shaped methods with the caller's
    /// arguments, forwarded in order and unmodified.
    async fn call(
        &self,
        request: ApiDappRequest,
        method: AdapterMethod,
        args: Vec<Value>,
    ) -> ProtocolResult<Value>;

    /// Accessor for the optional resetup capability. Checked once at
    /// registration time; adapters without the capability keep the default.
    fn resetup(&self) -> Option<&dyn ResetupRemoteConnection> {
        None
    }
}

/// Optional adapter capability: re-establish transport-level listeners
/// (e.g. after app resume).
#[async_trait]
pub trait ResetupRemoteConnection: Send + Sync {
    /// Re-subscribes whatever live transports the protocol keeps.
    async fn resetup_remote_connection(&self) -> AdapterResult<()>;
}

/// A shared adapter trait object.
pub type BoxedDappAdapter = Arc<dyn DappProtocolAdapter>;
