//! Persisted dApp session records and the storage collaborator interface.
//!
//! A [`StoredDappConnection`] is created by an adapter when a connection
//! handshake succeeds, updated on reconnection or session renewal, and
//! deleted on explicit disconnect or account removal. Adapters are the only
//! writers; the manager reads records solely to route
//! `close_remote_connection` to the owning protocol.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::Chain;
use crate::error::StoreResult;
use crate::protocol::DappProtocolType;

/// Metadata describing the remote dApp, as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DappMetadata {
    /// Origin the dApp connects from. Part of the storage key.
    pub origin: String,
    /// Human-readable dApp name.
    pub name: String,
    /// Icon URL, if the dApp provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Manifest URL the metadata was taken from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
}

/// Per-chain session tuple inside a stored connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSession {
    /// The chain this session is on.
    pub chain: Chain,
    /// Address exposed to the dApp.
    pub address: String,
    /// Network identifier (e.g. mainnet/testnet tag).
    pub network: String,
    /// Public key, for protocols that include it in session items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// A persisted dApp session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDappConnection {
    /// Owning protocol. `None` on records written before protocol tagging;
    /// those resolve to [`DappProtocolType::PRIMARY`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_type: Option<DappProtocolType>,
    /// The wallet account this connection belongs to.
    pub account_id: String,
    /// Remote dApp metadata.
    pub dapp: DappMetadata,
    /// Per-chain session tuples.
    pub sessions: Vec<ChainSession>,
    /// Protocol-specific opaque session data (bridge client ids, relay
    /// topics, key material references). Only the owning adapter reads it.
    #[serde(default)]
    pub protocol_data: Value,
}

impl StoredDappConnection {
    /// The protocol owning this record, defaulting legacy records to the
    /// primary protocol.
    pub fn protocol(&self) -> DappProtocolType {
        self.protocol_type.unwrap_or(DappProtocolType::PRIMARY)
    }
}

/// Storage collaborator for [`StoredDappConnection`] records.
///
/// Keyed by `(account_id, origin)`. Persistence mechanics live outside the
/// core; this interface is all the adapters see.
#[async_trait]
pub trait DappConnectionStore: Send + Sync {
    /// Fetches one record.
    async fn get(&self, account_id: &str, origin: &str) -> StoreResult<Option<StoredDappConnection>>;

    /// Inserts or replaces a record.
    async fn put(&self, connection: StoredDappConnection) -> StoreResult<()>;

    /// Deletes one record. Deleting a missing record is not an error.
    async fn delete(&self, account_id: &str, origin: &str) -> StoreResult<()>;

    /// Lists all records for one account.
    async fn list(&self, account_id: &str) -> StoreResult<Vec<StoredDappConnection>>;

    /// Lists every record. Used by adapters to re-establish transports on
    /// init/resetup.
    async fn all(&self) -> StoreResult<Vec<StoredDappConnection>>;
}

/// In-memory store backing tests and the default bootstrap.
#[derive(Default)]
pub struct MemoryDappConnectionStore {
    records: RwLock<HashMap<(String, String), StoredDappConnection>>,
}

impl MemoryDappConnectionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DappConnectionStore for MemoryDappConnectionStore {
    async fn get(&self, account_id: &str, origin: &str) -> StoreResult<Option<StoredDappConnection>> {
        let records = self.records.read().await;
        Ok(records.get(&(account_id.to_owned(), origin.to_owned())).cloned())
    }

    async fn put(&self, connection: StoredDappConnection) -> StoreResult<()> {
        let key = (connection.account_id.clone(), connection.dapp.origin.clone());
        self.records.write().await.insert(key, connection);
        Ok(())
    }

    async fn delete(&self, account_id: &str, origin: &str) -> StoreResult<()> {
        self.records
            .write()
            .await
            .remove(&(account_id.to_owned(), origin.to_owned()));
        Ok(())
    }

    async fn list(&self, account_id: &str) -> StoreResult<Vec<StoredDappConnection>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn all(&self) -> StoreResult<Vec<StoredDappConnection>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(account_id: &str, origin: &str) -> StoredDappConnection {
        StoredDappConnection {
            protocol_type: Some(DappProtocolType::TonConnect),
            account_id: account_id.to_owned(),
            dapp: DappMetadata {
                origin: origin.to_owned(),
                name: "Example".to_owned(),
                icon_url: None,
                manifest_url: None,
            },
            sessions: Vec::new(),
            protocol_data: Value::Null,
        }
    }

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = MemoryDappConnectionStore::new();
        store.put(record("acct-1", "https://dapp.example")).await.unwrap();

        let found = store.get("acct-1", "https://dapp.example").await.unwrap();
        assert!(found.is_some());

        store.delete("acct-1", "https://dapp.example").await.unwrap();
        let found = store.get("acct-1", "https://dapp.example").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn list_filters_by_account() {
        let store = MemoryDappConnectionStore::new();
        store.put(record("acct-1", "https://a.example")).await.unwrap();
        store.put(record("acct-1", "https://b.example")).await.unwrap();
        store.put(record("acct-2", "https://a.example")).await.unwrap();

        assert_eq!(store.list("acct-1").await.unwrap().len(), 2);
        assert_eq!(store.all().await.unwrap().len(), 3);
    }

    #[test]
    fn untagged_record_resolves_to_primary() {
        let mut rec = record("acct-1", "https://a.example");
        rec.protocol_type = None;
        assert_eq!(rec.protocol(), DappProtocolType::PRIMARY);
    }
}
