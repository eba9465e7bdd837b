//! The TonConnect adapter.
//!
//! Connect requests reach the wallet either through a deep link (QR code,
//! external browser) carrying a bridge client id, or directly from an
//! injected page. Live sessions are bridge subscriptions keyed by
//! `(account, origin)`; the stored record carries the client id so the
//! subscription survives restarts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use gangway_core::{
    AdapterMethod, AdapterResult, ApiDappRequest, Chain, ChainDappSupport, DappMetadata,
    DappProtocolAdapter, DappProtocolConfig, DappProtocolType, DappUpdate, DeepLink,
    ProtocolResult, StoredDappConnection,
};

use crate::bridge::BridgeClient;
use crate::model::{
    ConnectItemRequest, ConnectParams, DeviceInfo, ReconnectParams, SendTransactionParams,
    SessionParams, SignDataParams, bad_request, codes, method_not_supported, unknown,
    unknown_app, user_declined,
};

/// Query parameters of a TonConnect connect link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ConnectLink {
    version: Option<String>,
    client_id: Option<String>,
    request: Option<String>,
    ret: Option<String>,
}

/// Parses a connect link, returning `None` for URLs this protocol does not
/// recognize. Malformed URLs are simply not recognized.
fn parse_connect_link(raw: &str) -> Option<ConnectLink> {
    let url = Url::parse(raw).ok()?;
    let recognized = match url.scheme() {
        "tc" => true,
        "https" => url.path().trim_end_matches('/').ends_with("/ton-connect"),
        _ => false,
    };
    if !recognized {
        return None;
    }

    let mut link = ConnectLink::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "v" => link.version = Some(value.into_owned()),
            "id" => link.client_id = Some(value.into_owned()),
            "r" => link.request = Some(value.into_owned()),
            "ret" => link.ret = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(link)
}

fn origin_of(raw: &str) -> String {
    Url::parse(raw)
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_else(|_| raw.trim_end_matches('/').to_owned())
}

fn params<T: DeserializeOwned>(args: &[Value]) -> ProtocolResult<T> {
    let value = args.first().cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|err| bad_request(format!("invalid params: {err}")))
}

fn stored_client_id(connection: &StoredDappConnection) -> Option<&str> {
    connection.protocol_data.get("clientId").and_then(Value::as_str)
}

#[derive(Default)]
struct State {
    config: Option<Arc<DappProtocolConfig>>,
    /// Live bridge sessions keyed by `(account_id, origin)`.
    live: HashMap<(String, String), String>,
    /// Connect requests seen via deep link, keyed by bridge client id,
    /// awaiting the approval flow.
    pending: HashMap<String, Value>,
    initialized: bool,
}

/// TonConnect protocol adapter.
pub struct TonConnectAdapter {
    bridge: Arc<dyn BridgeClient>,
    state: RwLock<State>,
}

impl TonConnectAdapter {
    /// Creates the adapter over a bridge transport.
    pub fn new(bridge: Arc<dyn BridgeClient>) -> Self {
        Self {
            bridge,
            state: RwLock::new(State::default()),
        }
    }

    /// The connect request a deep link left behind for this client id, if
    /// the approval flow has not consumed it yet.
    pub async fn pending_connect_request(&self, client_id: &str) -> Option<Value> {
        self.state.read().await.pending.get(client_id).cloned()
    }

    async fn config(&self) -> ProtocolResult<Arc<DappProtocolConfig>> {
        self.state
            .read()
            .await
            .config
            .clone()
            .ok_or_else(|| unknown("tonconnect adapter is not initialized"))
    }

    fn ton_support(config: &DappProtocolConfig) -> ProtocolResult<&ChainDappSupport> {
        config
            .chain_support(Chain::Ton)
            .ok_or_else(|| method_not_supported("TON dapp support is not available"))
    }

    async fn drop_live_session(&self, account_id: &str, origin: &str) -> Option<String> {
        let client_id = {
            let mut state = self.state.write().await;
            state.live.remove(&(account_id.to_owned(), origin.to_owned()))
        };
        if let Some(client_id) = &client_id
            && let Err(error) = self.bridge.unsubscribe(client_id).await
        {
            warn!(client_id = %client_id, error = %error, "bridge unsubscribe failed");
        }
        client_id
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
            .map_err(|err| unknown(format!("storage failure: {err}")))?
            .ok_or_else(unknown_app)
    }

    async fn connect(&self, request: ApiDappRequest, p: ConnectParams) -> ProtocolResult<Value> {
        p.request.manifest.validate()?;
        let config = self.config().await?;

        let Some(account_id) = p.account_id else {
            // The approval flow declined; tell the dApp when it is reachable
            // over the bridge, then surface the decline to the caller.
            if let Some(client_id) = &p.client_id {
                let reply = json!({
                    "event": "connect_error",
                    "payload": {
                        "code": codes::USER_DECLINED,
                        "message": "user declined the connection",
                    },
                });
                if let Err(error) = self.bridge.send(client_id, reply.to_string().as_bytes()).await {
                    warn!(client_id = %client_id, error = %error, "failed to notify dapp of decline");
                }
                self.state.write().await.pending.remove(client_id);
            }
            return Err(user_declined());
        };

        let support = Self::ton_support(&config)?;
        let session = support.sdk.account_session(&account_id).await?;

        let mut items = Vec::with_capacity(p.request.items.len());
        for item in &p.request.items {
            match item {
                ConnectItemRequest::TonAddr => items.push(json!({
                    "name": "ton_addr",
                    "address": session.address,
                    "network": session.network,
                    "publicKey": session.public_key,
                })),
                ConnectItemRequest::TonProof { payload } => {
                    let proof = support
                        .sdk
                        .sign_data(&account_id, &json!({"type": "ton_proof", "payload": payload}))
                        .await?;
                    items.push(json!({"name": "ton_proof", "proof": proof}));
                }
            }
        }

        let origin = request
            .origin
            .clone()
            .unwrap_or_else(|| origin_of(&p.request.manifest.url));

        if let Some(client_id) = &p.client_id {
            self.bridge
                .subscribe(client_id)
                .await
                .map_err(|err| unknown(format!("bridge subscribe failed: {err}")))?;
        }

        let connection = StoredDappConnection {
            protocol_type: Some(DappProtocolType::TonConnect),
            account_id: account_id.clone(),
            dapp: DappMetadata {
                origin: origin.clone(),
                name: p.request.manifest.name.clone(),
                icon_url: p.request.manifest.icon_url.clone(),
                manifest_url: Some(p.request.manifest.url.clone()),
            },
            sessions: vec![session],
            protocol_data: p
                .client_id
                .as_ref()
                .map_or(Value::Null, |id| json!({"clientId": id})),
        };
        config
            .store
            .put(connection.clone())
            .await
            .map_err(|err| unknown(format!("storage failure: {err}")))?;

        {
            let mut state = self.state.write().await;
            if let Some(client_id) = &p.client_id {
                state.pending.remove(client_id);
                state.live.insert((account_id.clone(), origin.clone()), client_id.clone());
            }
        }

        config.emit(DappUpdate::DappConnect {
            account_id,
            dapp: connection.dapp.clone(),
        });
        info!(origin = %origin, "tonconnect dapp connected");

        Ok(json!({
            "event": "connect",
            "payload": {
                "items": items,
                "device": DeviceInfo::from_env(&config.env),
            },
        }))
    }

    async fn reconnect(&self, request: ApiDappRequest, p: ReconnectParams) -> ProtocolResult<Value> {
        let config = self.config().await?;
        let origin = request
            .origin
            .clone()
            .ok_or_else(|| bad_request("dapp origin is required"))?;
        let connection = Self::require_connection(&config, &p.account_id, &origin).await?;

        // Restore the bridge session when the record has one; a failure here
        // degrades the remote path but the in-page session still works.
        if let Some(client_id) = stored_client_id(&connection) {
            match self.bridge.subscribe(client_id).await {
                Ok(()) => {
                    self.state
                        .write()
                        .await
                        .live
                        .insert((p.account_id.clone(), origin.clone()), client_id.to_owned());
                }
                Err(error) => {
                    warn!(client_id = %client_id, error = %error, "bridge resubscribe failed");
                }
            }
        }

        let items: Vec<Value> = connection
            .sessions
            .iter()
            .map(|session| {
                json!({
                    "name": "ton_addr",
                    "address": session.address,
                    "network": session.network,
                    "publicKey": session.public_key,
                })
            })
            .collect();

        Ok(json!({
            "event": "connect",
            "payload": {
                "items": items,
                "device": DeviceInfo::from_env(&config.env),
            },
        }))
    }

    async fn disconnect(&self, request: ApiDappRequest, p: SessionParams) -> ProtocolResult<Value> {
        let config = self.config().await?;
        let origin = p
            .origin
            .or_else(|| request.origin.clone())
            .ok_or_else(|| bad_request("dapp origin is required"))?;

        self.drop_live_session(&p.account_id, &origin).await;
        config
            .store
            .delete(&p.account_id, &origin)
            .await
            .map_err(|err| unknown(format!("storage failure: {err}")))?;
        config.emit(DappUpdate::DappDisconnect {
            account_id: p.account_id.clone(),
            origin: origin.clone(),
        });
        info!(origin = %origin, "tonconnect dapp disconnected");
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
            .ok_or_else(|| bad_request("dapp origin is required"))?;
        Self::require_connection(&config, &p.account_id, &origin).await?;

        let support = Self::ton_support(&config)?;
        support.sdk.send_transaction(&p.account_id, &p.transaction).await
    }

    async fn sign_data(&self, request: ApiDappRequest, p: SignDataParams) -> ProtocolResult<Value> {
        let config = self.config().await?;
        let origin = p
            .origin
            .or_else(|| request.origin.clone())
            .ok_or_else(|| bad_request("dapp origin is required"))?;
        Self::require_connection(&config, &p.account_id, &origin).await?;

        let support = Self::ton_support(&config)?;
        if !support.supports_sign_data {
            return Err(method_not_supported("signData is not supported for this account"));
        }
        support.sdk.sign_data(&p.account_id, &p.payload).await
    }

    async fn deactivate(&self, request: ApiDappRequest, p: SessionParams) -> ProtocolResult<Value> {
        let origin = p
            .origin
            .or_else(|| request.origin.clone())
            .ok_or_else(|| bad_request("dapp origin is required"))?;
        self.drop_live_session(&p.account_id, &origin).await;
        debug!(origin = %origin, "tonconnect session deactivated");
        Ok(json!({}))
    }
}

#[async_trait]
impl DappProtocolAdapter for TonConnectAdapter {
    fn protocol_type(&self) -> DappProtocolType {
        DappProtocolType::TonConnect
    }

    async fn init(&self, config: Arc<DappProtocolConfig>) -> AdapterResult<()> {
        if self.state.read().await.initialized {
            debug!("tonconnect adapter already initialized");
            return Ok(());
        }

        // Re-establish bridge subscriptions for every stored session so
        // remote dApps can reach the wallet right after startup.
        let connections = config.store.all().await?;
        let mut live = HashMap::new();
        for connection in connections
            .iter()
            .filter(|c| c.protocol() == DappProtocolType::TonConnect)
        {
            let Some(client_id) = stored_client_id(connection) else {
                continue;
            };
            self.bridge.subscribe(client_id).await?;
            live.insert(
                (connection.account_id.clone(), connection.dapp.origin.clone()),
                client_id.to_owned(),
            );
        }

        let mut state = self.state.write().await;
        let sessions = live.len();
        state.live.extend(live);
        state.config = Some(config);
        state.initialized = true;
        info!(sessions, "tonconnect adapter initialized");
        Ok(())
    }

    async fn destroy(&self) -> AdapterResult<()> {
        let live = {
            let mut state = self.state.write().await;
            state.pending.clear();
            state.config = None;
            state.initialized = false;
            std::mem::take(&mut state.live)
        };
        for client_id in live.into_values() {
            if let Err(error) = self.bridge.unsubscribe(&client_id).await {
                warn!(client_id = %client_id, error = %error, "bridge unsubscribe failed during destroy");
            }
        }
        info!("tonconnect adapter destroyed");
        Ok(())
    }

    fn can_handle_deep_link(&self, url: &str) -> bool {
        parse_connect_link(url).is_some()
    }

    async fn handle_deep_link(&self, link: &DeepLink) -> ProtocolResult<Option<String>> {
        let parsed = parse_connect_link(&link.url)
            .ok_or_else(|| bad_request("not a tonconnect link"))?;
        if let Some(version) = &parsed.version
            && version != "2"
        {
            return Err(bad_request(format!("unsupported protocol version {version}")));
        }
        let config = self.config().await?;

        if let (Some(client_id), Some(request)) = (&parsed.client_id, &parsed.request) {
            let raw: Value = serde_json::from_str(request)
                .map_err(|err| bad_request(format!("malformed connect request: {err}")))?;
            self.state.write().await.pending.insert(client_id.clone(), raw);
        }

        config.emit(DappUpdate::DappConnectRequest {
            protocol: DappProtocolType::TonConnect,
            origin: None,
            request_id: link.request_id.clone(),
        });
        debug!(in_app = link.from_in_app_browser, "tonconnect deep link accepted");

        Ok(match parsed.ret.as_deref() {
            None | Some("back") | Some("none") => None,
            Some(ret) => Some(ret.to_owned()),
        })
    }

    async fn close_remote_connection(
        &self,
        account_id: &str,
        connection: &StoredDappConnection,
    ) -> ProtocolResult<()> {
        let dropped = self
            .drop_live_session(account_id, &connection.dapp.origin)
            .await;
        // The live map may not know records written by an earlier process.
        if dropped.is_none()
            && let Some(client_id) = stored_client_id(connection)
            && let Err(error) = self.bridge.unsubscribe(client_id).await
        {
            return Err(unknown(format!("bridge unsubscribe failed: {error}")));
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
}
