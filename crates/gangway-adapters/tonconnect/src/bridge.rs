//! Bridge transport collaborator.
//!
//! TonConnect dApps reach the wallet through an HTTP bridge: the wallet
//! holds a long-lived subscription per remote client id and posts encrypted
//! envelopes back. The socket/SSE mechanics live outside this crate; the
//! adapter only drives this interface.

use async_trait::async_trait;
use gangway_core::TransportResult;

/// Low-level bridge transport.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Starts listening for envelopes addressed from `client_id`.
    async fn subscribe(&self, client_id: &str) -> TransportResult<()>;

    /// Stops listening for `client_id`. Unsubscribing an unknown id is not
    /// an error.
    async fn unsubscribe(&self, client_id: &str) -> TransportResult<()>;

    /// Posts an envelope to `client_id`.
    async fn send(&self, client_id: &str, payload: &[u8]) -> TransportResult<()>;
}
