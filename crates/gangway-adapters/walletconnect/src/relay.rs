//! Relay transport collaborator.
//!
//! WalletConnect sessions run over a publish/subscribe relay server; the
//! wallet subscribes to pairing and session topics and publishes envelopes
//! back. The WebSocket mechanics live outside this crate.

use async_trait::async_trait;
use gangway_core::TransportResult;

/// Low-level relay transport.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Subscribes to a topic.
    async fn subscribe(&self, topic: &str) -> TransportResult<()>;

    /// Unsubscribes from a topic. Unknown topics are not an error.
    async fn unsubscribe(&self, topic: &str) -> TransportResult<()>;

    /// Publishes an envelope on a topic.
    async fn publish(&self, topic: &str, payload: &[u8]) -> TransportResult<()>;
}
