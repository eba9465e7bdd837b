//! The WalletConnect adapter.
//!
//! Pairing URIs arrive by deep link or QR scan; the wallet subscribes the
//! pairing topic and waits for the approval flow to settle the proposal into
//! a session. Live sessions are relay topic subscriptions keyed by
//! `(account, origin)`; the stored record carries the session topic so the
//! subscription survives restarts and app resumes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use gangway_core::{
    AdapterError, AdapterMethod, AdapterResult, ApiDappRequest, Chain, DappMetadata,
    DappProtocolAdapter, DappProtocolConfig, DappProtocolType, DappUpdate, DeepLink,
    ProtocolResult, ResetupRemoteConnection, StoredDappConnection,
};

use crate::model::{
    ConnectParams, ReconnectParams, SendTransactionParams, SessionParams, SignDataParams,
    chain_for_namespace, internal, invalid_pairing, invalid_params, namespace_for_chain,
    unauthorized, unsupported_chains, unsupported_method, user_rejected,
};
use crate::relay::RelayClient;

/// A parsed `wc:` pairing URI.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PairingUri {
    topic: String,
    version: u32,
    relay_protocol: Option<String>,
}

/// Parses a pairing URI, accepting both the `wc:` scheme and universal
/// `https` links carrying the URI in a `uri` query parameter. Anything
/// malformed is simply not recognized.
fn parse_pairing_uri(raw: &str) -> Option<PairingUri> {
    let url = Url::parse(raw).ok()?;
    match url.scheme() {
        "wc" => {
            let (topic, version) = url.path().split_once('@')?;
            if topic.is_empty() {
                return None;
            }
            Some(PairingUri {
                topic: topic.to_owned(),
                version: version.parse().ok()?,
                relay_protocol: url
                    .query_pairs()
                    .find(|(key, _)| key == "relay-protocol")
                    .map(|(_, value)| value.into_owned()),
            })
        }
        "https" => {
            let inner = url
                .query_pairs()
                .find(|(key, _)| key == "uri")
                .map(|(_, value)| value.into_owned())?;
            inner.starts_with("wc:").then(|| parse_pairing_uri(&inner)).flatten()
        }
        _ => None,
    }
}

fn origin_of(raw: &str) -> String {
    Url::parse(raw)
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_else(|_| raw.trim_end_matches('/').to_owned())
}

fn params<T: DeserializeOwned>(args: &[Value]) -> ProtocolResult<T> {
    let value = args.first().cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|err| invalid_params(format!("invalid params: {err}")))
}

fn stored_session_topic(connection: &StoredDappConnection) -> Option<&str> {
    connection.protocol_data.get("sessionTopic").and_then(Value::as_str)
}

fn caip_account(namespace: &str, network: &str, address: &str) -> String {
    format!("{namespace}:{network}:{address}")
}

#[derive(Default)]
struct State {
    config: Option<Arc<DappProtocolConfig>>,
    /// Live relay sessions keyed by `(account_id, origin)`, holding the
    /// session topic.
    live: HashMap<(String, String), String>,
    /// Pairing topics subscribed but not yet settled into a session.
    pending_pairings: HashSet<String>,
    initialized: bool,
}

/// WalletConnect protocol adapter.
pub struct WalletConnectAdapter {
    relay: Arc<dyn RelayClient>,
    state: RwLock<State>,
}

impl WalletConnectAdapter {
    /// Creates the adapter over a relay transport.
    pub fn new(relay: Arc<dyn RelayClient>) -> Self {
        Self {
            relay,
            state: RwLock::new(State::default()),
        }
    }

    async fn config(&self) -> ProtocolResult<Arc<DappProtocolConfig>> {
        self.state
            .read()
            .await
            .config
            .clone()
            .ok_or_else(|| internal("walletconnect adapter is not initialized"))
    }

    async fn require_connection(
        config: &DappProtocolConfig,
        account_id: &str,
        origin: &str,
    ) -> ProtocolResult<StoredDappConnection> {
        config
            .store
            .get(account_id, origin)
            .await
            .map_err(|err| internal(format!("storage failure: {err}")))?
            .ok_or_else(unauthorized)
    }

    async fn drop_live_session(&self, account_id: &str, origin: &str) -> Option<String> {
        let topic = {
            let mut state = self.state.write().await;
            state.live.remove(&(account_id.to_owned(), origin.to_owned()))
        };
        if let Some(topic) = &topic
            && let Err(error) = self.relay.unsubscribe(topic).await
        {
            warn!(topic = %topic, error = %error, "relay unsubscribe failed");
        }
        topic
    }

    /// Picks the chain a signing request targets: an explicit CAIP namespace
    /// key when given, the session's first chain otherwise.
    fn target_chain(
        connection: &StoredDappConnection,
        namespace: Option<&str>,
    ) -> ProtocolResult<Chain> {
        match namespace {
            Some(key) => chain_for_namespace(key)
                .ok_or_else(|| unsupported_chains(format!("namespace '{key}' is not supported"))),
            None => connection
                .sessions
                .first()
                .map(|session| session.chain)
                .ok_or_else(|| internal("stored session has no chains")),
        }
    }

    async fn connect(&self, request: ApiDappRequest, p: ConnectParams) -> ProtocolResult<Value> {
        let config = self.config().await?;

        let Some(account_id) = p.account_id else {
            // Rejected in the approval flow; tell the dApp over the pairing
            // topic when one exists, then surface the rejection.
            if let Some(pairing) = &p.proposal.pairing_topic {
                let reply = json!({
                    "method": "wc_sessionReject",
                    "params": {"reason": {"code": crate::model::codes::USER_REJECTED, "message": "user rejected the session"}},
                });
                if let Err(error) = self.relay.publish(pairing, reply.to_string().as_bytes()).await {
                    warn!(topic = %pairing, error = %error, "failed to publish session rejection");
                }
                self.state.write().await.pending_pairings.remove(pairing);
            }
            return Err(user_rejected());
        };

        let mut sessions = Vec::new();
        let mut namespaces = Map::new();
        for (key, requested) in &p.proposal.required_namespaces {
            let chain = chain_for_namespace(key)
                .ok_or_else(|| unsupported_chains(format!("namespace '{key}' is not supported")))?;
            let support = config
                .chain_support(chain)
                .ok_or_else(|| unsupported_chains(format!("chain '{chain}' is not available")))?;

            let session = support.sdk.account_session(&account_id).await?;
            let account = caip_account(key, &session.network, &session.address);
            namespaces.insert(
                key.clone(),
                json!({
                    "accounts": [account],
                    "methods": requested.methods,
                    "events": requested.events,
                }),
            );
            sessions.push(session);
        }
        if namespaces.is_empty() {
            return Err(unsupported_chains("proposal requests no namespaces"));
        }

        let session_topic = Uuid::new_v4().simple().to_string();
        self.relay
            .subscribe(&session_topic)
            .await
            .map_err(|err| internal(format!("relay subscribe failed: {err}")))?;

        let origin = request
            .origin
            .clone()
            .unwrap_or_else(|| origin_of(&p.proposal.proposer.url));
        let connection = StoredDappConnection {
            protocol_type: Some(DappProtocolType::WalletConnect),
            account_id: account_id.clone(),
            dapp: DappMetadata {
                origin: origin.clone(),
                name: p.proposal.proposer.name.clone(),
                icon_url: p.proposal.proposer.icons.first().cloned(),
                manifest_url: Some(p.proposal.proposer.url.clone()),
            },
            sessions,
            protocol_data: json!({
                "sessionTopic": session_topic,
                "pairingTopic": p.proposal.pairing_topic,
            }),
        };
        config
            .store
            .put(connection.clone())
            .await
            .map_err(|err| internal(format!("storage failure: {err}")))?;

        {
            let mut state = self.state.write().await;
            if let Some(pairing) = &p.proposal.pairing_topic {
                state.pending_pairings.remove(pairing);
            }
            state
                .live
                .insert((account_id.clone(), origin.clone()), session_topic.clone());
        }

        config.emit(DappUpdate::DappConnect {
            account_id,
            dapp: connection.dapp.clone(),
        });
        info!(origin = %origin, topic = %session_topic, "walletconnect session settled");

        Ok(json!({
            "topic": session_topic,
            "namespaces": Value::Object(namespaces),
        }))
    }

    async fn reconnect(&self, request: ApiDappRequest, p: ReconnectParams) -> ProtocolResult<Value> {
        let config = self.config().await?;
        let origin = request
            .origin
            .clone()
            .ok_or_else(|| invalid_params("dapp origin is required"))?;
        let connection = Self::require_connection(&config, &p.account_id, &origin).await?;

        let topic = stored_session_topic(&connection)
            .ok_or_else(|| internal("stored session has no relay topic"))?
            .to_owned();
        self.relay
            .subscribe(&topic)
            .await
            .map_err(|err| internal(format!("relay subscribe failed: {err}")))?;
        self.state
            .write()
            .await
            .live
            .insert((p.account_id.clone(), origin), topic.clone());

        let namespaces: Map<String, Value> = connection
            .sessions
            .iter()
            .map(|session| {
                let key = namespace_for_chain(session.chain);
                (
                    key.to_owned(),
                    json!({
                        "accounts": [caip_account(key, &session.network, &session.address)],
                        "methods": [],
                        "events": [],
                    }),
                )
            })
            .collect();

        Ok(json!({
            "topic": topic,
            "namespaces": Value::Object(namespaces),
        }))
    }

    async fn disconnect(&self, request: ApiDappRequest, p: SessionParams) -> ProtocolResult<Value> {
        let config = self.config().await?;
        let origin = p
            .origin
            .or_else(|| request.origin.clone())
            .ok_or_else(|| invalid_params("dapp origin is required"))?;

        let topic = match self.drop_live_session(&p.account_id, &origin).await {
            Some(topic) => Some(topic),
            None => {
                // Not live in this process; the stored record may still
                // carry the topic the dApp listens on.
                config
                    .store
                    .get(&p.account_id, &origin)
                    .await
                    .map_err(|err| internal(format!("storage failure: {err}")))?
                    .as_ref()
                    .and_then(stored_session_topic)
                    .map(str::to_owned)
            }
        };
        if let Some(topic) = topic {
            let notice = json!({"method": "wc_sessionDelete", "params": {"code": 6000, "message": "user disconnected"}});
            if let Err(error) = self.relay.publish(&topic, notice.to_string().as_bytes()).await {
                warn!(topic = %topic, error = %error, "failed to publish session delete");
            }
        }

        config
            .store
            .delete(&p.account_id, &origin)
            .await
            .map_err(|err| internal(format!("storage failure: {err}")))?;
        config.emit(DappUpdate::DappDisconnect {
            account_id: p.account_id.clone(),
            origin: origin.clone(),
        });
        info!(origin = %origin, "walletconnect session disconnected");
        Ok(json!({}))
    }

    async fn send_transaction(
        &self,
        request: ApiDappRequest,
        p: SendTransactionParams,
    ) -> ProtocolResult<Value> {
        let config = self.config().await?;
        let origin = p
            .origin
            .or_else(|| request.origin.clone())
            .ok_or_else(|| invalid_params("dapp origin is required"))?;
        let connection = Self::require_connection(&config, &p.account_id, &origin).await?;

        let chain = Self::target_chain(&connection, p.chain.as_deref())?;
        let support = config
            .chain_support(chain)
            .ok_or_else(|| unsupported_chains(format!("chain '{chain}' is not available")))?;
        support.sdk.send_transaction(&p.account_id, &p.transaction).await
    }

    async fn sign_data(&self, request: ApiDappRequest, p: SignDataParams) -> ProtocolResult<Value> {
        let config = self.config().await?;
        let origin = p
            .origin
            .or_else(|| request.origin.clone())
            .ok_or_else(|| invalid_params("dapp origin is required"))?;
        let connection = Self::require_connection(&config, &p.account_id, &origin).await?;

        let chain = Self::target_chain(&connection, p.chain.as_deref())?;
        let support = config
            .chain_support(chain)
            .ok_or_else(|| unsupported_chains(format!("chain '{chain}' is not available")))?;
        if !support.supports_sign_data {
            return Err(unsupported_method("signData is not supported for this chain"));
        }
        support.sdk.sign_data(&p.account_id, &p.payload).await
    }

    async fn deactivate(&self, request: ApiDappRequest, p: SessionParams) -> ProtocolResult<Value> {
        let origin = p
            .origin
            .or_else(|| request.origin.clone())
            .ok_or_else(|| invalid_params("dapp origin is required"))?;
        self.drop_live_session(&p.account_id, &origin).await;
        debug!(origin = %origin, "walletconnect session deactivated");
        Ok(json!({}))
    }

    /// Subscribes the relay topics of every stored WalletConnect record,
    /// replacing the live map. Shared by `init` and the resetup hook.
    async fn resubscribe_stored_sessions(
        &self,
        config: &DappProtocolConfig,
    ) -> AdapterResult<usize> {
        let connections = config.store.all().await?;
        let mut live = HashMap::new();
        for connection in connections
            .iter()
            .filter(|c| c.protocol() == DappProtocolType::WalletConnect)
        {
            let Some(topic) = stored_session_topic(connection) else {
                continue;
            };
            self.relay.subscribe(topic).await?;
            live.insert(
                (connection.account_id.clone(), connection.dapp.origin.clone()),
                topic.to_owned(),
            );
        }
        let count = live.len();
        self.state.write().await.live = live;
        Ok(count)
    }
}

#[async_trait]
impl DappProtocolAdapter for WalletConnectAdapter {
    fn protocol_type(&self) -> DappProtocolType {
        DappProtocolType::WalletConnect
    }

    async fn init(&self, config: Arc<DappProtocolConfig>) -> AdapterResult<()> {
        if self.state.read().await.initialized {
            debug!("walletconnect adapter already initialized");
            return Ok(());
        }

        let sessions = self.resubscribe_stored_sessions(&config).await?;

        let mut state = self.state.write().await;
        state.config = Some(config);
        state.initialized = true;
        info!(sessions, "walletconnect adapter initialized");
        Ok(())
    }

    async fn destroy(&self) -> AdapterResult<()> {
        let (live, pairings) = {
            let mut state = self.state.write().await;
            state.config = None;
            state.initialized = false;
            (
                std::mem::take(&mut state.live),
                std::mem::take(&mut state.pending_pairings),
            )
        };
        for topic in live.into_values().chain(pairings) {
            if let Err(error) = self.relay.unsubscribe(&topic).await {
                warn!(topic = %topic, error = %error, "relay unsubscribe failed during destroy");
            }
        }
        info!("walletconnect adapter destroyed");
        Ok(())
    }

    fn can_handle_deep_link(&self, url: &str) -> bool {
        parse_pairing_uri(url).is_some()
    }

    async fn handle_deep_link(&self, link: &DeepLink) -> ProtocolResult<Option<String>> {
        let pairing = parse_pairing_uri(&link.url)
            .ok_or_else(|| invalid_pairing("not a walletconnect pairing uri"))?;
        if pairing.version != 2 {
            return Err(invalid_pairing(format!(
                "unsupported pairing version {}",
                pairing.version
            )));
        }
        let config = self.config().await?;

        self.relay
            .subscribe(&pairing.topic)
            .await
            .map_err(|err| internal(format!("relay subscribe failed: {err}")))?;
        self.state
            .write()
            .await
            .pending_pairings
            .insert(pairing.topic.clone());

        config.emit(DappUpdate::DappConnectRequest {
            protocol: DappProtocolType::WalletConnect,
            origin: None,
            request_id: link.request_id.clone(),
        });
        debug!(topic = %pairing.topic, relay = ?pairing.relay_protocol, "walletconnect pairing accepted");

        // Pairing URIs carry no return strategy; the dApp waits on the relay.
        Ok(None)
    }

    async fn close_remote_connection(
        &self,
        account_id: &str,
        connection: &StoredDappConnection,
    ) -> ProtocolResult<()> {
        let dropped = self
            .drop_live_session(account_id, &connection.dapp.origin)
            .await;
        if dropped.is_none()
            && let Some(topic) = stored_session_topic(connection)
            && let Err(error) = self.relay.unsubscribe(topic).await
        {
            return Err(internal(format!("relay unsubscribe failed: {error}")));
        }
        Ok(())
    }

    async fn call(
        &self,
        request: ApiDappRequest,
        method: AdapterMethod,
        args: Vec<Value>,
    ) -> ProtocolResult<Value> {
        match method {
            AdapterMethod::Connect => self.connect(request, params(&args)?).await,
            AdapterMethod::Reconnect => self.reconnect(request, params(&args)?).await,
            AdapterMethod::Disconnect => self.disconnect(request, params(&args)?).await,
            AdapterMethod::SendTransaction => self.send_transaction(request, params(&args)?).await,
            AdapterMethod::SignData => self.sign_data(request, params(&args)?).await,
            AdapterMethod::Deactivate => self.deactivate(request, params(&args)?).await,
        }
    }

    fn resetup(&self) -> Option<&dyn ResetupRemoteConnection> {
        Some(self)
    }
}

#[async_trait]
impl ResetupRemoteConnection for WalletConnectAdapter {
    async fn resetup_remote_connection(&self) -> AdapterResult<()> {
        let config = self
            .state
            .read()
            .await
            .config
            .clone()
            .ok_or_else(|| AdapterError::internal("walletconnect adapter is not initialized"))?;
        let sessions = self.resubscribe_stored_sessions(&config).await?;
        info!(sessions, "walletconnect relay sessions re-established");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::codes;
    use gangway_core::{
        ChainDappSdk, ChainSession, DappConnectionStore, MemoryDappConnectionStore, ProtocolError,
        RuntimeEnv, TransportResult, ChainDappSupport,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockRelay {
        subscribed: Mutex<Vec<String>>,
        unsubscribed: Mutex<Vec<String>>,
        published: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl RelayClient for MockRelay {
        async fn subscribe(&self, topic: &str) -> TransportResult<()> {
            self.subscribed.lock().unwrap().push(topic.to_owned());
            Ok(())
        }

        async fn unsubscribe(&self, topic: &str) -> TransportResult<()> {
            self.unsubscribed.lock().unwrap().push(topic.to_owned());
            Ok(())
        }

        async fn publish(&self, topic: &str, payload: &[u8]) -> TransportResult<()> {
            self.published.lock().unwrap().push((topic.to_owned(), payload.to_vec()));
            Ok(())
        }
    }

    struct MockSdk(Chain);

    #[async_trait]
    impl ChainDappSdk for MockSdk {
        async fn account_session(&self, _account_id: &str) -> Result<ChainSession, ProtocolError> {
            Ok(match self.0 {
                Chain::Ethereum => ChainSession {
                    chain: Chain::Ethereum,
                    address: "0xabc".to_owned(),
                    network: "1".to_owned(),
                    public_key: None,
                },
                Chain::Ton => ChainSession {
                    chain: Chain::Ton,
                    address: "UQexample".to_owned(),
                    network: "-239".to_owned(),
                    public_key: Some("pubkey".to_owned()),
                },
            })
        }

        async fn prepare_transaction(
            &self,
            _account_id: &str,
            payload: &Value,
        ) -> Result<Value, ProtocolError> {
            Ok(payload.clone())
        }

        async fn send_transaction(
            &self,
            _account_id: &str,
            _payload: &Value,
        ) -> Result<Value, ProtocolError> {
            Ok(json!({"hash": "0xsigned"}))
        }

        async fn sign_data(&self, _account_id: &str, _payload: &Value) -> Result<Value, ProtocolError> {
            Ok(json!({"signature": "0xsig"}))
        }
    }

    type Updates = Arc<Mutex<Vec<DappUpdate>>>;

    fn test_config(store: Arc<MemoryDappConnectionStore>) -> (Arc<DappProtocolConfig>, Updates) {
        let updates: Updates = Arc::default();
        let sink_updates = Arc::clone(&updates);
        let config = Arc::new(DappProtocolConfig {
            on_update: Arc::new(move |update| sink_updates.lock().unwrap().push(update)),
            env: RuntimeEnv::default(),
            chain_dapp_supports: [
                (Chain::Ethereum, ChainDappSupport::new(Chain::Ethereum, Arc::new(MockSdk(Chain::Ethereum)))),
                (Chain::Ton, ChainDappSupport::new(Chain::Ton, Arc::new(MockSdk(Chain::Ton)))),
            ]
            .into_iter()
            .collect(),
            store,
        });
        (config, updates)
    }

    async fn initialized_adapter() -> (WalletConnectAdapter, Arc<MockRelay>, Arc<MemoryDappConnectionStore>, Updates)
    {
        let relay = Arc::new(MockRelay::default());
        let store = Arc::new(MemoryDappConnectionStore::new());
        let (config, updates) = test_config(Arc::clone(&store));
        let adapter = WalletConnectAdapter::new(relay.clone());
        adapter.init(config).await.unwrap();
        (adapter, relay, store, updates)
    }

    fn connect_args(account_id: Option<&str>, pairing_topic: Option<&str>) -> Vec<Value> {
        vec![json!({
            "accountId": account_id,
            "proposal": {
                "pairingTopic": pairing_topic,
                "proposer": {
                    "name": "Example Dapp",
                    "url": "https://dapp.example/app",
                    "icons": ["https://dapp.example/icon.png"],
                },
                "requiredNamespaces": {
                    "eip155": {
                        "chains": ["eip155:1"],
                        "methods": ["eth_sendTransaction"],
                        "events": ["accountsChanged"],
                    },
                },
            },
        })]
    }

    #[test]
    fn recognizes_pairing_uris() {
        let adapter = WalletConnectAdapter::new(Arc::new(MockRelay::default()));

        assert!(adapter.can_handle_deep_link("wc:topic1@2?relay-protocol=irn&symKey=aa"));
        assert!(adapter.can_handle_deep_link(
            "https://wallet.example/open?uri=wc%3Atopic1%402%3Frelay-protocol%3Dirn"
        ));
        assert!(!adapter.can_handle_deep_link("tc://connect?v=2"));
        assert!(!adapter.can_handle_deep_link("wc:@2"));
        assert!(!adapter.can_handle_deep_link("wc:topic-without-version"));
    }

    #[tokio::test]
    async fn pairing_deep_link_subscribes_topic_and_emits() {
        let (adapter, relay, _store, updates) = initialized_adapter().await;

        let redirect = adapter
            .handle_deep_link(&DeepLink::new("wc:pairing-1@2?relay-protocol=irn"))
            .await
            .unwrap();

        assert!(redirect.is_none());
        assert_eq!(relay.subscribed.lock().unwrap().as_slice(), ["pairing-1"]);
        assert!(matches!(
            updates.lock().unwrap().last(),
            Some(DappUpdate::DappConnectRequest {
                protocol: DappProtocolType::WalletConnect,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unsupported_pairing_version_is_rejected() {
        let (adapter, _relay, _store, _updates) = initialized_adapter().await;

        let err = adapter
            .handle_deep_link(&DeepLink::new("wc:pairing-1@1?bridge=x"))
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::INVALID_PAIRING);
    }

    #[tokio::test]
    async fn connect_settles_a_session() {
        let (adapter, relay, store, updates) = initialized_adapter().await;

        let reply = adapter
            .call(
                ApiDappRequest::internal(),
                AdapterMethod::Connect,
                connect_args(Some("acct-1"), None),
            )
            .await
            .unwrap();

        let topic = reply["topic"].as_str().expect("session topic");
        assert_eq!(
            reply["namespaces"]["eip155"]["accounts"][0],
            "eip155:1:0xabc"
        );
        assert_eq!(relay.subscribed.lock().unwrap().as_slice(), [topic]);

        let stored = store
            .get("acct-1", "https://dapp.example")
            .await
            .unwrap()
            .expect("connection persisted");
        assert_eq!(stored.protocol(), DappProtocolType::WalletConnect);
        assert_eq!(stored.protocol_data["sessionTopic"], topic);
        assert!(matches!(
            updates.lock().unwrap().last(),
            Some(DappUpdate::DappConnect { account_id, .. }) if account_id == "acct-1"
        ));
    }

    #[tokio::test]
    async fn unsupported_namespace_is_code_5100() {
        let (adapter, _relay, _store, _updates) = initialized_adapter().await;

        let err = adapter
            .call(
                ApiDappRequest::internal(),
                AdapterMethod::Connect,
                vec![json!({
                    "accountId": "acct-1",
                    "proposal": {
                        "proposer": {"name": "Example", "url": "https://dapp.example"},
                        "requiredNamespaces": {
                            "cosmos": {"chains": ["cosmos:cosmoshub-4"]},
                        },
                    },
                })],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::UNSUPPORTED_CHAINS);
    }

    #[tokio::test]
    async fn rejected_proposal_publishes_to_pairing_topic() {
        let (adapter, relay, _store, _updates) = initialized_adapter().await;

        let err = adapter
            .call(
                ApiDappRequest::internal(),
                AdapterMethod::Connect,
                connect_args(None, Some("pairing-1")),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, codes::USER_REJECTED);
        let published = relay.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "pairing-1");
    }

    #[tokio::test]
    async fn reconnect_without_stored_session_is_unauthorized() {
        let (adapter, _relay, _store, _updates) = initialized_adapter().await;

        let err = adapter
            .call(
                ApiDappRequest::from_page("https://stranger.example"),
                AdapterMethod::Reconnect,
                vec![json!({"accountId": "acct-1"})],
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn send_transaction_targets_the_session_chain() {
        let (adapter, _relay, _store, _updates) = initialized_adapter().await;

        adapter
            .call(
                ApiDappRequest::from_page("https://dapp.example"),
                AdapterMethod::Connect,
                connect_args(Some("acct-1"), None),
            )
            .await
            .unwrap();

        let result = adapter
            .call(
                ApiDappRequest::from_page("https://dapp.example"),
                AdapterMethod::SendTransaction,
                vec![json!({
                    "accountId": "acct-1",
                    "transaction": {"to": "0xother", "value": "0x1"},
                })],
            )
            .await
            .unwrap();
        assert_eq!(result, json!({"hash": "0xsigned"}));
    }

    #[tokio::test]
    async fn disconnect_notifies_the_dapp_and_deletes_the_record() {
        let (adapter, relay, store, updates) = initialized_adapter().await;

        adapter
            .call(
                ApiDappRequest::from_page("https://dapp.example"),
                AdapterMethod::Connect,
                connect_args(Some("acct-1"), None),
            )
            .await
            .unwrap();

        adapter
            .call(
                ApiDappRequest::from_page("https://dapp.example"),
                AdapterMethod::Disconnect,
                vec![json!({"accountId": "acct-1"})],
            )
            .await
            .unwrap();

        assert!(store.get("acct-1", "https://dapp.example").await.unwrap().is_none());
        let published = relay.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert!(matches!(
            updates.lock().unwrap().last(),
            Some(DappUpdate::DappDisconnect { .. })
        ));
    }

    #[tokio::test]
    async fn resetup_resubscribes_stored_session_topics() {
        let (adapter, relay, store, _updates) = initialized_adapter().await;

        store
            .put(StoredDappConnection {
                protocol_type: Some(DappProtocolType::WalletConnect),
                account_id: "acct-1".to_owned(),
                dapp: DappMetadata {
                    origin: "https://dapp.example".to_owned(),
                    name: "Example Dapp".to_owned(),
                    icon_url: None,
                    manifest_url: None,
                },
                sessions: Vec::new(),
                protocol_data: json!({"sessionTopic": "topic-9"}),
            })
            .await
            .unwrap();

        let hook = adapter.resetup().expect("walletconnect supports resetup");
        hook.resetup_remote_connection().await.unwrap();

        assert!(relay.subscribed.lock().unwrap().contains(&"topic-9".to_owned()));
    }

    #[tokio::test]
    async fn resetup_before_init_fails() {
        let adapter = WalletConnectAdapter::new(Arc::new(MockRelay::default()));
        let hook = adapter.resetup().expect("capability present");
        assert!(hook.resetup_remote_connection().await.is_err());
    }
}
