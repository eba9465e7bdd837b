//! Background-worker message bridge.
//!
//! The worker surface is message-based: requests and responses cross a
//! process/thread boundary as JSON. Errors are flattened into a payload that
//! keeps protocol error codes intact so the far side can render them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CallError;
use crate::manager::DappProtocolManager;
use crate::request::ApiDappRequest;
use crate::surface::{GenericMethodTable, dispatch};

/// One inbound worker message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    /// Correlation id echoed back in the response.
    pub id: u64,
    /// Wire method name.
    pub name: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Origin of the context that queued the message, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// Error payload crossing the worker boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerError {
    /// Protocol error code, when the failure came from an adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Error message.
    pub message: String,
    /// User-facing message, when the adapter supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl From<CallError> for WorkerError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Protocol(err) => Self {
                code: Some(err.code),
                message: err.message,
                display: err.display,
            },
            other => Self {
                code: None,
                message: other.to_string(),
                display: None,
            },
        }
    }
}

/// One outbound worker message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponse {
    /// Correlation id from the request.
    pub id: u64,
    /// Successful result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WorkerError>,
}

/// Entry point for the background-worker message bridge.
#[derive(Clone)]
pub struct WorkerBinding {
    manager: Arc<DappProtocolManager>,
    table: Arc<GenericMethodTable>,
}

impl WorkerBinding {
    /// Creates the binding.
    pub fn new(manager: Arc<DappProtocolManager>, table: Arc<GenericMethodTable>) -> Self {
        Self { manager, table }
    }

    /// Handles one worker message, producing the response to post back.
    pub async fn handle(&self, request: WorkerRequest) -> WorkerResponse {
        let WorkerRequest { id, name, args, origin } = request;
        let api_request = ApiDappRequest::from_worker(origin);
        match dispatch(&self.manager, &self.table, api_request, &name, args).await {
            Ok(value) => WorkerResponse {
                id,
                result: Some(value),
                error: None,
            },
            Err(err) => WorkerResponse {
                id,
                result: None,
                error: Some(err.into()),
            },
        }
    }
}
