//! # Gangway
//!
//! A unified dApp connection backend for multi-protocol cryptocurrency
//! wallets.
//!
//! ## Overview
//!
//! A wallet that talks to dApps must speak several mutually incompatible
//! connection protocols, each with its own message schema, transport and
//! error taxonomy. Gangway multiplexes them behind one internal call
//! surface: protocol adapters implement a shared contract, a manager owns
//! their lifecycle and routes deep links, and three thin bindings expose the
//! same dispatch core to the wallet UI, an extension content script and a
//! background worker.
//!
//! ## Architecture
//!
//! ```text
//! UI / page script / worker
//!         │  "<protocol>_<method>" | generic name
//!         ▼
//!   call surface ──▶ router ──▶ manager ──▶ adapter (TonConnect, WalletConnect)
//!                       │
//!                       └─────▶ generic method table
//! ```
//!
//! - **Core**: adapter contract, method router, manager, call surfaces
//! - **Adapters**: protocol implementations over injected transports
//! - **Runtime**: configuration, logging and the explicit once-per-process
//!   service bootstrap
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gangway::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     gangway::runtime::logging::init_from_config(&config.logging);
//!
//!     let service = DappServiceBuilder::new()
//!         .env(config.app.runtime_env())
//!         .protocols(config.protocols.clone())
//!         .chain_support(ChainDappSupport::new(Chain::Ton, ton_sdk))
//!         .adapter(Arc::new(TonConnectAdapter::new(bridge)))
//!         .adapter(Arc::new(WalletConnectAdapter::new(relay)))
//!         .on_update(|update| println!("{update:?}"))
//!         .build()
//!         .await;
//!     service.init().await;
//!
//!     let reply = service
//!         .direct()
//!         .call("tonConnect_reconnect", vec![serde_json::json!({"accountId": "acct-1"})])
//!         .await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `tonconnect` *(default)*: TonConnect protocol adapter
//! - `walletconnect` *(default)*: WalletConnect protocol adapter
//! - `toml-config` *(default)*: TOML configuration files

pub use gangway_core as core;
pub use gangway_runtime as runtime;

#[cfg(feature = "tonconnect")]
pub use gangway_adapter_tonconnect as tonconnect;
#[cfg(feature = "walletconnect")]
pub use gangway_adapter_walletconnect as walletconnect;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use gangway::prelude::*;
/// ```
pub mod prelude {
    // Service bootstrap - main entry point
    pub use gangway_runtime::{ConfigLoader, DappServiceBuilder, LoggingBuilder, ServiceCell};

    // Core contract and dispatch types
    pub use gangway_core::{
        AdapterMethod, ApiDappRequest, BoxedDappAdapter, Chain, ChainDappSdk, ChainDappSupport,
        DappProtocolAdapter, DappProtocolConfig, DappProtocolManager, DappProtocolType,
        DappUpdate, DeepLink, MethodRoute, ProtocolError, StoredDappConnection, route_method,
    };

    // Storage collaborator
    pub use gangway_core::{DappConnectionStore, MemoryDappConnectionStore};

    // Protocol adapters
    #[cfg(feature = "tonconnect")]
    pub use gangway_adapter_tonconnect::{BridgeClient, TonConnectAdapter};
    #[cfg(feature = "walletconnect")]
    pub use gangway_adapter_walletconnect::{RelayClient, WalletConnectAdapter};
}
