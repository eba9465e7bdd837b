//! Wallet Host Example
//!
//! Demonstrates embedding the Gangway dApp connection subsystem in a host
//! process: transports and the chain SDK are stubbed in memory, the service
//! is assembled through `DappServiceBuilder`, and a TonConnect connect flow
//! is driven end to end — deep link, approval, page-surface transaction.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package wallet-host
//! ```
//!
//! Configuration is read from `gangway.toml` in the working directory and
//! `GANGWAY_`-prefixed environment variables, e.g.:
//!
//! ```bash
//! GANGWAY_LOGGING__LEVEL=debug cargo run --package wallet-host
//! ```

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use gangway::core::{ChainSession, ProtocolResult, TransportResult};
use gangway::prelude::*;
use gangway::runtime::logging;

// ============================================================================
// Stub collaborators
// ============================================================================

/// Bridge transport that only logs; a real host wires the SSE/HTTP client.
struct LoopbackBridge;

#[async_trait]
impl BridgeClient for LoopbackBridge {
    async fn subscribe(&self, client_id: &str) -> TransportResult<()> {
        info!(client_id, "bridge subscribed");
        Ok(())
    }

    async fn unsubscribe(&self, client_id: &str) -> TransportResult<()> {
        info!(client_id, "bridge unsubscribed");
        Ok(())
    }

    async fn send(&self, client_id: &str, payload: &[u8]) -> TransportResult<()> {
        info!(client_id, bytes = payload.len(), "bridge envelope sent");
        Ok(())
    }
}

/// Relay transport that only logs; a real host wires the WebSocket client.
struct LoopbackRelay;

#[async_trait]
impl RelayClient for LoopbackRelay {
    async fn subscribe(&self, topic: &str) -> TransportResult<()> {
        info!(topic, "relay subscribed");
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> TransportResult<()> {
        info!(topic, "relay unsubscribed");
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> TransportResult<()> {
        info!(topic, bytes = payload.len(), "relay envelope published");
        Ok(())
    }
}

/// TON chain SDK returning canned sessions and signatures.
struct DemoTonSdk;

#[async_trait]
impl ChainDappSdk for DemoTonSdk {
    async fn account_session(&self, account_id: &str) -> ProtocolResult<ChainSession> {
        Ok(ChainSession {
            chain: Chain::Ton,
            address: format!("UQdemo-{account_id}"),
            network: "-239".to_owned(),
            public_key: Some("demo-public-key".to_owned()),
        })
    }

    async fn prepare_transaction(&self, _account_id: &str, payload: &Value) -> ProtocolResult<Value> {
        Ok(json!({"prepared": payload}))
    }

    async fn send_transaction(&self, _account_id: &str, _payload: &Value) -> ProtocolResult<Value> {
        Ok(json!({"boc": "te6cckEBAQEAAgAAAEysuc0="}))
    }

    async fn sign_data(&self, _account_id: &str, payload: &Value) -> ProtocolResult<Value> {
        Ok(json!({"signature": "demo-signature", "payload": payload}))
    }
}

// ============================================================================
// Host
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigLoader::new().load()?;
    logging::init_from_config(&config.logging);

    let service = DappServiceBuilder::new()
        .env(config.app.runtime_env())
        .protocols(config.protocols.clone())
        .chain_support(ChainDappSupport::new(Chain::Ton, Arc::new(DemoTonSdk)))
        .adapter(Arc::new(TonConnectAdapter::new(Arc::new(LoopbackBridge))))
        .adapter(Arc::new(WalletConnectAdapter::new(Arc::new(LoopbackRelay))))
        .on_update(|update| info!(?update, "update emitted"))
        .build()
        .await;
    service.init().await;

    // A dApp hands over a connect request by deep link (QR scan or browser).
    let redirect = service
        .handle_deep_link(&DeepLink::new("tc://connect?v=2&id=demo-client&ret=none"))
        .await?;
    info!(?redirect, "deep link handled");

    // The approval flow accepted; the adapter settles the connection.
    let reply = service
        .direct()
        .call(
            "tonConnect_connect",
            vec![json!({
                "accountId": "acct-demo",
                "clientId": "demo-client",
                "request": {
                    "manifest": {
                        "url": "https://dapp.example/app",
                        "name": "Demo Dapp",
                    },
                    "items": [{"name": "ton_addr"}],
                },
            })],
        )
        .await?;
    println!("connect reply:\n{}", serde_json::to_string_pretty(&reply)?);

    // The connected dApp sends a transaction through the page surface.
    let tx = service
        .content_script()
        .call(
            "https://dapp.example",
            "tonConnect_sendTransaction",
            vec![json!({
                "accountId": "acct-demo",
                "transaction": {"messages": [{"address": "UQother", "amount": "1"}]},
            })],
        )
        .await?;
    println!("transaction reply:\n{tx}");

    service.destroy().await;
    Ok(())
}
