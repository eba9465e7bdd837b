//! Process bootstrap for the dApp connection subsystem.
//!
//! [`DappServiceBuilder`] collects everything the subsystem needs — runtime
//! environment, update sink, session store, chain capabilities, adapters —
//! and wires the manager, the generic method table and the three call-surface
//! bindings together. The result, [`DappService`], is the single entry point
//! the host embeds.
//!
//! One service instance exists per running process. There is no hidden
//! global: hosts that need process-wide sharing hold a [`ServiceCell`] and
//! pass it down explicitly.
//!
//! ```rust,ignore
//! static SERVICE: ServiceCell = ServiceCell::new();
//!
//! let service = SERVICE
//!     .get_or_create(|| async {
//!         DappServiceBuilder::new()
//!             .env(config.app.runtime_env())
//!             .protocols(config.protocols.clone())
//!             .store(store)
//!             .chain_support(ChainDappSupport::new(Chain::Ton, ton_sdk))
//!             .adapter(Arc::new(TonConnectAdapter::new(bridge)))
//!             .on_update(move |update| ui.push(update))
//!             .build()
//!             .await
//!     })
//!     .await;
//! service.init().await;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::info;

use gangway_core::{
    ApiDappRequest, BoxedDappAdapter, CallError, Chain, ChainDappSupport, ContentScriptBinding,
    DappConnectionStore, DappProtocolConfig, DappProtocolManager, DappProtocolType, DappUpdate,
    DeepLink, DirectBinding, GenericMethodTable, ManagerError, MemoryDappConnectionStore,
    ProtocolResult, RuntimeEnv, StoredDappConnection, UpdateSink, WorkerBinding,
};

use crate::config::ProtocolsConfig;

/// Embedder-supplied cache-flush hook behind the `flushMemoryCache` generic
/// method.
pub type FlushHook = Arc<dyn Fn() + Send + Sync>;

/// Builder for [`DappService`].
pub struct DappServiceBuilder {
    env: RuntimeEnv,
    on_update: Option<UpdateSink>,
    store: Option<Arc<dyn DappConnectionStore>>,
    chain_dapp_supports: HashMap<Chain, ChainDappSupport>,
    adapters: Vec<BoxedDappAdapter>,
    protocols: ProtocolsConfig,
    flush_hook: Option<FlushHook>,
}

impl Default for DappServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DappServiceBuilder {
    /// Creates a builder with defaults: in-memory store, no chains, all
    /// protocols enabled, updates dropped.
    pub fn new() -> Self {
        Self {
            env: RuntimeEnv::default(),
            on_update: None,
            store: None,
            chain_dapp_supports: HashMap::new(),
            adapters: Vec::new(),
            protocols: ProtocolsConfig::default(),
            flush_hook: None,
        }
    }

    /// Sets the runtime environment descriptor.
    pub fn env(mut self, env: RuntimeEnv) -> Self {
        self.env = env;
        self
    }

    /// Sets the update sink the adapters emit UI events through.
    pub fn on_update<F>(mut self, sink: F) -> Self
    where
        F: Fn(DappUpdate) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(sink));
        self
    }

    /// Sets the session storage collaborator.
    pub fn store(mut self, store: Arc<dyn DappConnectionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Adds a chain capability descriptor.
    pub fn chain_support(mut self, support: ChainDappSupport) -> Self {
        self.chain_dapp_supports.insert(support.chain, support);
        self
    }

    /// Adds a protocol adapter. Adapters whose protocol is disabled in the
    /// configuration are skipped at build time.
    pub fn adapter(mut self, adapter: BoxedDappAdapter) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Sets per-protocol enablement from the loaded configuration.
    pub fn protocols(mut self, protocols: ProtocolsConfig) -> Self {
        self.protocols = protocols;
        self
    }

    /// Sets the cache-flush hook behind `flushMemoryCache`.
    pub fn on_flush<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.flush_hook = Some(Arc::new(hook));
        self
    }

    /// Constructs the service: registers enabled adapters, wires the built-in
    /// generic methods and all three bindings. Does not initialize the
    /// adapters; call [`DappService::init`] for that.
    pub async fn build(self) -> DappService {
        let manager = Arc::new(DappProtocolManager::new());
        for adapter in self.adapters {
            let protocol = adapter.protocol_type();
            if !self.protocols.is_enabled(protocol) {
                info!(protocol = %protocol, "protocol disabled by configuration, skipping adapter");
                continue;
            }
            manager.register_adapter(adapter).await;
        }

        let config = Arc::new(DappProtocolConfig {
            on_update: self.on_update.unwrap_or_else(|| Arc::new(|_| {})),
            env: self.env,
            chain_dapp_supports: self.chain_dapp_supports,
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryDappConnectionStore::new())),
        });

        let table = Arc::new(GenericMethodTable::new());
        register_builtin_methods(
            &table,
            &manager,
            &config,
            self.flush_hook.unwrap_or_else(|| Arc::new(|| {})),
        );

        DappService {
            direct: DirectBinding::new(Arc::clone(&manager), Arc::clone(&table)),
            content_script: ContentScriptBinding::new(Arc::clone(&manager), Arc::clone(&table)),
            worker: WorkerBinding::new(Arc::clone(&manager), Arc::clone(&table)),
            manager,
            table,
            config,
        }
    }
}

/// The assembled dApp connection subsystem.
pub struct DappService {
    manager: Arc<DappProtocolManager>,
    table: Arc<GenericMethodTable>,
    config: Arc<DappProtocolConfig>,
    direct: DirectBinding,
    content_script: ContentScriptBinding,
    worker: WorkerBinding,
}

impl DappService {
    /// Initializes every registered adapter. Per-adapter failures are
    /// contained by the manager; this always completes.
    pub async fn init(&self) {
        self.manager.init(Arc::clone(&self.config)).await;
    }

    /// Destroys every initialized adapter and clears the registry.
    pub async fn destroy(&self) {
        self.manager.destroy().await;
    }

    /// Offers a deep link to the initialized adapters.
    pub async fn handle_deep_link(&self, link: &DeepLink) -> ProtocolResult<Option<String>> {
        self.manager.handle_deep_link(link).await
    }

    /// Re-establishes transport listeners after an app resume.
    pub async fn resetup_remote_connection(&self, protocol: Option<DappProtocolType>) {
        self.manager.resetup_remote_connection(protocol).await;
    }

    /// Terminates the live transport of one stored session.
    pub async fn close_remote_connection(
        &self,
        account_id: &str,
        connection: &StoredDappConnection,
    ) -> Result<(), ManagerError> {
        self.manager.close_remote_connection(account_id, connection).await
    }

    /// The adapter registry and lifecycle orchestrator.
    pub fn manager(&self) -> &Arc<DappProtocolManager> {
        &self.manager
    }

    /// The generic method table, for host-specific additions.
    pub fn generic_methods(&self) -> &GenericMethodTable {
        &self.table
    }

    /// Entry point for trusted same-process callers.
    pub fn direct(&self) -> &DirectBinding {
        &self.direct
    }

    /// Entry point for the extension content-script bridge.
    pub fn content_script(&self) -> &ContentScriptBinding {
        &self.content_script
    }

    /// Entry point for the background-worker message bridge.
    pub fn worker(&self) -> &WorkerBinding {
        &self.worker
    }
}

/// Explicit once-per-process holder for a shared [`DappService`].
///
/// Replaces a lazy global singleton: the cell is declared by the host and
/// passed down, so ownership stays visible while "one instance per process"
/// is still guaranteed.
pub struct ServiceCell {
    cell: OnceCell<Arc<DappService>>,
}

impl ServiceCell {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// The held service, if one was created.
    pub fn get(&self) -> Option<Arc<DappService>> {
        self.cell.get().cloned()
    }

    /// Returns the held service, creating it on first call. Concurrent
    /// callers race on one `create` invocation; the rest wait for it.
    pub async fn get_or_create<F, Fut>(&self, create: F) -> Arc<DappService>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DappService>,
    {
        Arc::clone(
            self.cell
                .get_or_init(|| async { Arc::new(create().await) })
                .await,
        )
    }
}

impl Default for ServiceCell {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Built-in generic methods
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrepareTransactionParams {
    account_id: String,
    chain: String,
    transaction: Value,
}

fn parse_params<T: DeserializeOwned>(args: &[Value]) -> Result<T, CallError> {
    let value = args.first().cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|err| CallError::InvalidParams(err.to_string()))
}

fn register_builtin_methods(
    table: &GenericMethodTable,
    manager: &Arc<DappProtocolManager>,
    config: &Arc<DappProtocolConfig>,
    flush: FlushHook,
) {
    // processDeeplink(url, isFromInAppBrowser?, requestId?)
    let deeplink_manager = Arc::clone(manager);
    table.register("processDeeplink", move |_request: ApiDappRequest, args| {
        let manager = Arc::clone(&deeplink_manager);
        async move {
            let url = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| CallError::InvalidParams("deeplink url is required".to_owned()))?
                .to_owned();
            let mut link = DeepLink::new(url);
            if args.get(1).and_then(Value::as_bool).unwrap_or(false) {
                link = link.from_in_app_browser();
            }
            if let Some(id) = args.get(2).and_then(Value::as_str) {
                link = link.with_request_id(id);
            }

            let result = manager.handle_deep_link(&link).await?;
            Ok(result.map_or(Value::Null, Value::String))
        }
    });

    // prepareTransaction({accountId, chain, transaction})
    let prepare_config = Arc::clone(config);
    table.register("prepareTransaction", move |_request, args| {
        let config = Arc::clone(&prepare_config);
        async move {
            let params: PrepareTransactionParams = parse_params(&args)?;
            let chain = Chain::from_str_id(&params.chain)
                .ok_or_else(|| CallError::InvalidParams(format!("unknown chain '{}'", params.chain)))?;
            let support = config.chain_support(chain).ok_or_else(|| {
                CallError::InvalidParams(format!("chain '{chain}' has no dapp support"))
            })?;
            Ok(support
                .sdk
                .prepare_transaction(&params.account_id, &params.transaction)
                .await?)
        }
    });

    // flushMemoryCache()
    table.register("flushMemoryCache", move |_request, _args| {
        let flush = Arc::clone(&flush);
        async move {
            flush();
            Ok(Value::Null)
        }
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolConfig;
    use gangway_core::{
        AdapterMethod, AdapterResult, ChainDappSdk, ChainSession, DappProtocolAdapter,
        ProtocolError,
    };

    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SpyAdapter {
        protocol: DappProtocolType,
        rpc_calls: AtomicUsize,
    }

    impl SpyAdapter {
        fn new(protocol: DappProtocolType) -> Self {
            Self {
                protocol,
                rpc_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DappProtocolAdapter for SpyAdapter {
        fn protocol_type(&self) -> DappProtocolType {
            self.protocol
        }

        async fn init(&self, _config: Arc<DappProtocolConfig>) -> AdapterResult<()> {
            Ok(())
        }

        async fn destroy(&self) -> AdapterResult<()> {
            Ok(())
        }

        fn can_handle_deep_link(&self, url: &str) -> bool {
            url.starts_with("tc://")
        }

        async fn handle_deep_link(&self, link: &DeepLink) -> ProtocolResult<Option<String>> {
            Ok(Some(format!("handled:{}", link.url)))
        }

        async fn close_remote_connection(
            &self,
            _account_id: &str,
            _connection: &StoredDappConnection,
        ) -> ProtocolResult<()> {
            Ok(())
        }

        async fn call(
            &self,
            _request: ApiDappRequest,
            _method: AdapterMethod,
            args: Vec<Value>,
        ) -> ProtocolResult<Value> {
            self.rpc_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Array(args))
        }
    }

    struct MockSdk;

    #[async_trait]
    impl ChainDappSdk for MockSdk {
        async fn account_session(&self, _account_id: &str) -> Result<ChainSession, ProtocolError> {
            Ok(ChainSession {
                chain: Chain::Ton,
                address: "UQexample".to_owned(),
                network: "-239".to_owned(),
                public_key: None,
            })
        }

        async fn prepare_transaction(
            &self,
            _account_id: &str,
            payload: &Value,
        ) -> Result<Value, ProtocolError> {
            Ok(json!({"prepared": payload}))
        }

        async fn send_transaction(
            &self,
            _account_id: &str,
            _payload: &Value,
        ) -> Result<Value, ProtocolError> {
            Ok(Value::Null)
        }

        async fn sign_data(&self, _account_id: &str, _payload: &Value) -> Result<Value, ProtocolError> {
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn built_service_routes_all_three_surfaces() {
        let service = DappServiceBuilder::new()
            .adapter(Arc::new(SpyAdapter::new(DappProtocolType::TonConnect)))
            .chain_support(ChainDappSupport::new(Chain::Ton, Arc::new(MockSdk)))
            .build()
            .await;
        service.init().await;

        let args = vec![json!({"accountId": "acct-1"})];
        let direct = service.direct().call("tonConnect_connect", args.clone()).await.unwrap();
        assert_eq!(direct, Value::Array(args.clone()));

        let page = service
            .content_script()
            .call("https://dapp.example", "tonConnect_sendTransaction", args.clone())
            .await
            .unwrap();
        assert_eq!(page, Value::Array(args));

        let response = service
            .worker()
            .handle(gangway_core::WorkerRequest {
                id: 1,
                name: "flushMemoryCache".to_owned(),
                args: Vec::new(),
                origin: None,
            })
            .await;
        assert_eq!(response.result, Some(Value::Null));
    }

    #[tokio::test]
    async fn process_deeplink_generic_method_reaches_the_manager() {
        let service = DappServiceBuilder::new()
            .adapter(Arc::new(SpyAdapter::new(DappProtocolType::TonConnect)))
            .build()
            .await;
        service.init().await;

        let result = service
            .content_script()
            .call(
                "https://dapp.example",
                "processDeeplink",
                vec![json!("tc://connect?v=2"), json!(true), json!("req-1")],
            )
            .await
            .unwrap();
        assert_eq!(result, json!("handled:tc://connect?v=2"));

        // An unclaimed link is null, not an error.
        let unclaimed = service
            .direct()
            .call("processDeeplink", vec![json!("https://unrelated.example")])
            .await
            .unwrap();
        assert_eq!(unclaimed, Value::Null);
    }

    #[tokio::test]
    async fn prepare_transaction_uses_the_chain_capability() {
        let service = DappServiceBuilder::new()
            .chain_support(ChainDappSupport::new(Chain::Ton, Arc::new(MockSdk)))
            .build()
            .await;

        let result = service
            .direct()
            .call(
                "prepareTransaction",
                vec![json!({"accountId": "acct-1", "chain": "ton", "transaction": {"amount": "1"}})],
            )
            .await
            .unwrap();
        assert_eq!(result, json!({"prepared": {"amount": "1"}}));

        let err = service
            .direct()
            .call(
                "prepareTransaction",
                vec![json!({"accountId": "acct-1", "chain": "solana", "transaction": {}})],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn flush_hook_is_invoked() {
        let flushes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&flushes);
        let service = DappServiceBuilder::new()
            .on_flush(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .await;

        service.direct().call("flushMemoryCache", Vec::new()).await.unwrap();
        assert_eq!(flushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_protocol_is_not_registered() {
        let service = DappServiceBuilder::new()
            .adapter(Arc::new(SpyAdapter::new(DappProtocolType::TonConnect)))
            .adapter(Arc::new(SpyAdapter::new(DappProtocolType::WalletConnect)))
            .protocols(ProtocolsConfig {
                wallet_connect: ProtocolConfig { enabled: false },
                ..ProtocolsConfig::default()
            })
            .build()
            .await;
        service.init().await;

        assert!(service.manager().get_adapter(DappProtocolType::TonConnect).await.is_some());
        assert!(service.manager().get_adapter(DappProtocolType::WalletConnect).await.is_none());

        let err = service
            .direct()
            .call("walletConnect_connect", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::AdapterNotRegistered(DappProtocolType::WalletConnect)
        ));
    }

    #[tokio::test]
    async fn service_cell_creates_exactly_once() {
        let cell = ServiceCell::new();
        assert!(cell.get().is_none());

        let created = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = Arc::clone(&created);
            cell.get_or_create(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                DappServiceBuilder::new().build().await
            })
            .await;
        }

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(cell.get().is_some());
    }
}
