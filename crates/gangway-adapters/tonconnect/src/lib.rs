//! TonConnect adapter for the Gangway dApp connection subsystem.
//!
//! Implements the [`DappProtocolAdapter`](gangway_core::DappProtocolAdapter)
//! contract for TonConnect-style dApps: deep-link/QR connect flows over an
//! HTTP bridge, injected in-page sessions, and the TonConnect error
//! taxonomy. Bridge socket mechanics stay behind the [`BridgeClient`] trait.

mod adapter;
mod bridge;
mod model;

pub use adapter::TonConnectAdapter;
pub use bridge::BridgeClient;
pub use model::{
    ConnectItemRequest, ConnectParams, ConnectRequestPayload, DappManifest, DeviceInfo,
    ReconnectParams, SendTransactionParams, SessionParams, SignDataParams, codes,
};
