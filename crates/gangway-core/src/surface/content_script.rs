//! Extension content-script call binding.
//!
//! Requests on this surface originate from page script, which is untrusted:
//! any method name can arrive here. The binding rejects everything outside a
//! literal allow-list before the router ever sees the name, and stamps the
//! verified page origin into the request so handlers never trust
//! caller-supplied origin claims.

use std::sync::Arc;

use serde_json::Value;

use crate::error::CallError;
use crate::manager::DappProtocolManager;
use crate::request::ApiDappRequest;
use crate::surface::{GenericMethodTable, dispatch};

/// Exact, case-sensitive set of method names a page may invoke.
pub const PAGE_ALLOWED_METHODS: [&str; 15] = [
    "flushMemoryCache",
    "prepareTransaction",
    "processDeeplink",
    "tonConnect_connect",
    "tonConnect_reconnect",
    "tonConnect_disconnect",
    "tonConnect_sendTransaction",
    "tonConnect_deactivate",
    "tonConnect_signData",
    "walletConnect_connect",
    "walletConnect_reconnect",
    "walletConnect_disconnect",
    "walletConnect_sendTransaction",
    "walletConnect_deactivate",
    "walletConnect_signData",
];

/// Entry point for the extension content-script bridge.
#[derive(Clone)]
pub struct ContentScriptBinding {
    manager: Arc<DappProtocolManager>,
    table: Arc<GenericMethodTable>,
}

impl ContentScriptBinding {
    /// Creates the binding.
    pub fn new(manager: Arc<DappProtocolManager>, table: Arc<GenericMethodTable>) -> Self {
        Self { manager, table }
    }

    /// Invokes a method on behalf of a page.
    ///
    /// `origin` is the origin the content script observed, not anything the
    /// page sent. Names outside [`PAGE_ALLOWED_METHODS`] are rejected before
    /// any routing or adapter lookup.
    pub async fn call(
        &self,
        origin: impl Into<String>,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, CallError> {
        if !PAGE_ALLOWED_METHODS.contains(&name) {
            return Err(CallError::MethodNotAllowed(name.to_owned()));
        }
        let request = ApiDappRequest::from_page(origin);
        dispatch(&self.manager, &self.table, request, name, args).await
    }
}
