//! WalletConnect adapter for the Gangway dApp connection subsystem.
//!
//! Implements the [`DappProtocolAdapter`](gangway_core::DappProtocolAdapter)
//! contract for WalletConnect-style dApps: relay pairing via `wc:` URIs,
//! CAIP-namespaced multi-chain sessions, and the EIP-1193/WalletConnect
//! error taxonomy. Relay socket mechanics stay behind the [`RelayClient`]
//! trait. This adapter also carries the resetup capability: stored session
//! topics are resubscribed after an app resume.

mod adapter;
mod model;
mod relay;

pub use adapter::WalletConnectAdapter;
pub use model::{
    ConnectParams, PeerMetadata, ProposalNamespace, ReconnectParams, SendTransactionParams,
    SessionParams, SessionProposal, SignDataParams, codes,
};
pub use relay::RelayClient;
