//! Unified error types for the dApp protocol layer.
//!
//! The split mirrors the propagation policy of the manager:
//!
//! - [`ProtocolError`] is an RPC/business failure. The manager is a thin
//!   dispatcher for these: they pass through to the original caller
//!   unmodified, since only the owning adapter knows how to interpret its
//!   numeric codes.
//! - [`AdapterError`] is a lifecycle failure (`init`, `destroy`, resetup).
//!   The manager contains and logs these so one broken protocol cannot block
//!   the others.
//! - [`ManagerError`] and [`CallError`] are dispatch failures: configuration
//!   bugs (missing adapter) or call-surface rejections (unknown or
//!   disallowed method).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::DappProtocolType;

// =============================================================================
// Protocol (RPC) Errors
// =============================================================================

/// A typed protocol failure carrying a protocol-specific numeric code.
///
/// Codes live in the adapter crates; the core never interprets them. The
/// optional `display` payload is a user-facing message the UI layer may
/// render instead of the wire message.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct ProtocolError {
    /// Protocol-specific numeric error code.
    pub code: i64,
    /// Wire-level error message.
    pub message: String,
    /// Optional user-facing message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl ProtocolError {
    /// Creates a protocol error.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            display: None,
        }
    }

    /// Attaches a user-facing display message.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

// =============================================================================
// Transport & Storage Errors
// =============================================================================

/// Errors from the underlying bridge/relay transports.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// Connection closed.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors from the session storage collaborator.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The storage backend failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

// =============================================================================
// Adapter Lifecycle Errors
// =============================================================================

/// Errors from adapter lifecycle operations.
///
/// These never reach the callers of `Manager::init`/`destroy`; the manager
/// logs them and reflects them only through the `initialized` flag.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// Internal adapter error.
    #[error("adapter error: {0}")]
    Internal(String),

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Storage error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdapterError {
    /// Creates an internal adapter error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors from manager-level dispatch.
#[derive(Debug, Clone, Error)]
pub enum ManagerError {
    /// No adapter registered for the requested protocol. A registration bug,
    /// not a transient condition; surfaced to the caller without retry.
    #[error("no adapter registered for protocol '{0}'")]
    AdapterNotRegistered(DappProtocolType),

    /// Protocol error forwarded from the adapter.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Errors from the call-surface bindings.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// Method rejected by the untrusted-context allow-list.
    #[error("method '{0}' is not allowed from this context")]
    MethodNotAllowed(String),

    /// Method name resolved to nothing callable.
    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    /// Malformed arguments for a generic method.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// No adapter registered for a recognized protocol call.
    #[error("no adapter registered for protocol '{0}'")]
    AdapterNotRegistered(DappProtocolType),

    /// Protocol error forwarded from the adapter.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<ManagerError> for CallError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::AdapterNotRegistered(protocol) => Self::AdapterNotRegistered(protocol),
            ManagerError::Protocol(err) => Self::Protocol(err),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for protocol RPC operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Result type for adapter lifecycle operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
