//! Registry and lifecycle orchestrator for dApp protocol adapters.
//!
//! The manager holds one adapter per protocol, routes deep links to the
//! protocol that claims them, and bridges generic requests to the correct
//! adapter. Registration and initialization are split into two phases:
//! registering is synchronous and cheap and declares which protocols exist;
//! `init` is async and may fail per adapter, and declares which are ready.
//! A crash in one protocol's network setup never prevents the others from
//! becoming ready.
//!
//! Bulk operations (`init`, `destroy`) fan out concurrently and wait for
//! every attempt to settle, tolerating partial failure: protocols are
//! independent and the wallet should stay partially functional.
//!
//! One manager instance exists per running process, constructed explicitly
//! by the bootstrap and passed down by reference — there is no hidden
//! global accessor.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::adapter::{BoxedDappAdapter, DeepLink};
use crate::config::DappProtocolConfig;
use crate::connection::StoredDappConnection;
use crate::error::{ManagerError, ProtocolResult};
use crate::protocol::DappProtocolType;

/// Internal record pairing an adapter with its initialization status.
///
/// `initialized` is true iff `init` has resolved without error and
/// `destroy` has not since been called. Mutated only by the manager.
struct Registration {
    adapter: BoxedDappAdapter,
    initialized: bool,
    supports_resetup: bool,
}

#[derive(Default)]
struct Inner {
    registrations: HashMap<DappProtocolType, Registration>,
    /// Registration order; deep-link probing and the resetup scan follow it.
    order: Vec<DappProtocolType>,
    config: Option<Arc<DappProtocolConfig>>,
}

/// Registry and lifecycle orchestrator for all protocol adapters.
#[derive(Default)]
pub struct DappProtocolManager {
    inner: RwLock<Inner>,
}

impl DappProtocolManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its protocol type.
    ///
    /// Idempotent: a second registration for the same protocol is a logged
    /// no-op, never an error, so bootstrap code can be re-entrant. The
    /// optional resetup capability is checked here, once, rather than at
    /// every call site.
    pub async fn register_adapter(&self, adapter: BoxedDappAdapter) {
        let protocol = adapter.protocol_type();
        let mut inner = self.inner.write().await;

        if inner.registrations.contains_key(&protocol) {
            warn!(protocol = %protocol, "adapter already registered, ignoring");
            return;
        }

        let supports_resetup = adapter.resetup().is_some();
        inner.order.push(protocol);
        inner.registrations.insert(
            protocol,
            Registration {
                adapter,
                initialized: false,
                supports_resetup,
            },
        );
        debug!(
            protocol = %protocol,
            resetup = supports_resetup,
            "registered dapp protocol adapter"
        );
    }

    /// Stores the config and initializes every registered-but-uninitialized
    /// adapter concurrently.
    ///
    /// All init futures are started before any is awaited; adapters observe
    /// no ordering relative to each other. Per-adapter failures are logged
    /// and leave that registration uninitialized. This method itself always
    /// completes once every attempt has settled.
    pub async fn init(&self, config: Arc<DappProtocolConfig>) {
        let pending: Vec<(DappProtocolType, BoxedDappAdapter)> = {
            let mut inner = self.inner.write().await;
            inner.config = Some(Arc::clone(&config));
            inner
                .order
                .iter()
                .filter_map(|protocol| {
                    let reg = inner.registrations.get(protocol)?;
                    (!reg.initialized).then(|| (*protocol, Arc::clone(&reg.adapter)))
                })
                .collect()
        };

        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "initializing dapp protocol adapters");

        let results = future::join_all(pending.into_iter().map(|(protocol, adapter)| {
            let config = Arc::clone(&config);
            async move { (protocol, adapter.init(config).await) }
        }))
        .await;

        let mut inner = self.inner.write().await;
        for (protocol, result) in results {
            match result {
                Ok(()) => {
                    if let Some(reg) = inner.registrations.get_mut(&protocol) {
                        reg.initialized = true;
                        debug!(protocol = %protocol, "adapter initialized");
                    }
                }
                Err(error) => {
                    warn!(protocol = %protocol, error = %error, "adapter init failed");
                }
            }
        }
    }

    /// Looks up the adapter registered for a protocol.
    pub async fn get_adapter(&self, protocol: DappProtocolType) -> Option<BoxedDappAdapter> {
        let inner = self.inner.read().await;
        inner
            .registrations
            .get(&protocol)
            .map(|reg| Arc::clone(&reg.adapter))
    }

    /// Whether the given protocol is registered and initialized.
    pub async fn is_initialized(&self, protocol: DappProtocolType) -> bool {
        let inner = self.inner.read().await;
        inner
            .registrations
            .get(&protocol)
            .is_some_and(|reg| reg.initialized)
    }

    /// Offers a deep link to initialized adapters in registration order.
    ///
    /// The first adapter whose predicate claims the URL handles it, and its
    /// result (or error) is returned immediately; no further adapters are
    /// probed. An unclaimed link is a normal outcome: logged, `Ok(None)`.
    pub async fn handle_deep_link(&self, link: &DeepLink) -> ProtocolResult<Option<String>> {
        let candidates: Vec<(DappProtocolType, BoxedDappAdapter)> = {
            let inner = self.inner.read().await;
            inner
                .order
                .iter()
                .filter_map(|protocol| {
                    let reg = inner.registrations.get(protocol)?;
                    reg.initialized.then(|| (*protocol, Arc::clone(&reg.adapter)))
                })
                .collect()
        };

        for (protocol, adapter) in candidates {
            if adapter.can_handle_deep_link(&link.url) {
                debug!(protocol = %protocol, url = %link.url, "deep link claimed");
                return adapter.handle_deep_link(link).await;
            }
        }

        debug!(url = %link.url, "no adapter claimed deep link");
        Ok(None)
    }

    /// Re-establishes transport listeners on at most one adapter.
    ///
    /// Sequential scan in registration order: with a protocol filter, acts
    /// on that adapter if initialized; without one, acts on the first
    /// initialized registration and returns. Resetting only the
    /// first-registered adapter when no filter is given is long-standing
    /// observable behavior and is pinned by a test; see DESIGN.md before
    /// changing it.
    pub async fn resetup_remote_connection(&self, protocol: Option<DappProtocolType>) {
        let target = {
            let inner = self.inner.read().await;
            inner.order.iter().find_map(|candidate| {
                if protocol.is_some_and(|p| p != *candidate) {
                    return None;
                }
                let reg = inner.registrations.get(candidate)?;
                if !reg.initialized {
                    return None;
                }
                Some((*candidate, reg.supports_resetup, Arc::clone(&reg.adapter)))
            })
        };

        let Some((protocol, supports_resetup, adapter)) = target else {
            debug!("no initialized adapter to resetup");
            return;
        };

        if !supports_resetup {
            debug!(protocol = %protocol, "adapter has no resetup capability");
            return;
        }
        if let Some(hook) = adapter.resetup()
            && let Err(error) = hook.resetup_remote_connection().await
        {
            warn!(protocol = %protocol, error = %error, "adapter resetup failed");
        }
    }

    /// Terminates the live transport of one stored session.
    ///
    /// The owning protocol is taken from the record (legacy untagged records
    /// default to the primary protocol). A missing adapter is a registration
    /// bug and is surfaced to the caller; adapter errors pass through.
    pub async fn close_remote_connection(
        &self,
        account_id: &str,
        connection: &StoredDappConnection,
    ) -> Result<(), ManagerError> {
        let protocol = connection.protocol();
        let adapter = self
            .get_adapter(protocol)
            .await
            .ok_or(ManagerError::AdapterNotRegistered(protocol))?;
        adapter.close_remote_connection(account_id, connection).await?;
        Ok(())
    }

    /// Destroys every initialized adapter concurrently, then clears the
    /// registry.
    ///
    /// Individual destroy failures are logged, and the registry is cleared
    /// regardless so a fresh bootstrap can start from a clean slate.
    pub async fn destroy(&self) {
        let targets: Vec<(DappProtocolType, BoxedDappAdapter)> = {
            let inner = self.inner.read().await;
            inner
                .order
                .iter()
                .filter_map(|protocol| {
                    let reg = inner.registrations.get(protocol)?;
                    reg.initialized.then(|| (*protocol, Arc::clone(&reg.adapter)))
                })
                .collect()
        };

        let results = future::join_all(targets.into_iter().map(|(protocol, adapter)| async move {
            (protocol, adapter.destroy().await)
        }))
        .await;

        for (protocol, result) in results {
            if let Err(error) = result {
                warn!(protocol = %protocol, error = %error, "adapter destroy failed");
            }
        }

        let mut inner = self.inner.write().await;
        inner.registrations.clear();
        inner.order.clear();
        inner.config = None;
        debug!("dapp protocol registry cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DappUpdate, RuntimeEnv};
    use crate::connection::{DappMetadata, MemoryDappConnectionStore};
    use crate::error::{AdapterError, AdapterResult, ProtocolError};
    use crate::request::ApiDappRequest;
    use crate::routing::AdapterMethod;
    use crate::adapter::{DappProtocolAdapter, ResetupRemoteConnection};

    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SpyAdapter {
        protocol: DappProtocolType,
        fail_init: bool,
        claim_prefix: Option<&'static str>,
        with_resetup: bool,
        init_calls: AtomicUsize,
        deep_link_calls: AtomicUsize,
        close_calls: AtomicUsize,
        resetup_calls: AtomicUsize,
        rpc_calls: AtomicUsize,
        last_args: Mutex<Option<Vec<Value>>>,
    }

    impl SpyAdapter {
        fn new(protocol: DappProtocolType) -> Self {
            Self {
                protocol,
                fail_init: false,
                claim_prefix: None,
                with_resetup: false,
                init_calls: AtomicUsize::new(0),
                deep_link_calls: AtomicUsize::new(0),
                close_calls: AtomicUsize::new(0),
                resetup_calls: AtomicUsize::new(0),
                rpc_calls: AtomicUsize::new(0),
                last_args: Mutex::new(None),
            }
        }

        fn failing_init(mut self) -> Self {
            self.fail_init = true;
            self
        }

        fn claiming(mut self, prefix: &'static str) -> Self {
            self.claim_prefix = Some(prefix);
            self
        }

        fn with_resetup(mut self) -> Self {
            self.with_resetup = true;
            self
        }
    }

    #[async_trait]
    impl DappProtocolAdapter for SpyAdapter {
        fn protocol_type(&self) -> DappProtocolType {
            self.protocol
        }

        async fn init(&self, _config: Arc<DappProtocolConfig>) -> AdapterResult<()> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                Err(AdapterError::internal("boom"))
            } else {
                Ok(())
            }
        }

        async fn destroy(&self) -> AdapterResult<()> {
            Ok(())
        }

        fn can_handle_deep_link(&self, url: &str) -> bool {
            self.claim_prefix.is_some_and(|prefix| url.starts_with(prefix))
        }

        async fn handle_deep_link(&self, link: &DeepLink) -> ProtocolResult<Option<String>> {
            self.deep_link_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(format!("handled:{}", link.url)))
        }

        async fn close_remote_connection(
            &self,
            _account_id: &str,
            _connection: &StoredDappConnection,
        ) -> ProtocolResult<()> {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn call(
            &self,
            _request: ApiDappRequest,
            _method: AdapterMethod,
            args: Vec<Value>,
        ) -> ProtocolResult<Value> {
            self.rpc_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_args.lock().unwrap() = Some(args);
            Ok(Value::Null)
        }

        fn resetup(&self) -> Option<&dyn ResetupRemoteConnection> {
            self.with_resetup.then_some(self as &dyn ResetupRemoteConnection)
        }
    }

    #[async_trait]
    impl ResetupRemoteConnection for SpyAdapter {
        async fn resetup_remote_connection(&self) -> AdapterResult<()> {
            self.resetup_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_config() -> Arc<DappProtocolConfig> {
        Arc::new(DappProtocolConfig {
            on_update: Arc::new(|_: DappUpdate| {}),
            env: RuntimeEnv::default(),
            chain_dapp_supports: HashMap::new(),
            store: Arc::new(MemoryDappConnectionStore::new()),
        })
    }

    fn stored(protocol: Option<DappProtocolType>) -> StoredDappConnection {
        StoredDappConnection {
            protocol_type: protocol,
            account_id: "acct-1".to_owned(),
            dapp: DappMetadata {
                origin: "https://dapp.example".to_owned(),
                name: "Example".to_owned(),
                icon_url: None,
                manifest_url: None,
            },
            sessions: Vec::new(),
            protocol_data: Value::Null,
        }
    }

    #[tokio::test]
    async fn get_adapter_returns_registered_instance() {
        let manager = DappProtocolManager::new();
        let adapter = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect));
        manager.register_adapter(adapter.clone()).await;

        let found = manager
            .get_adapter(DappProtocolType::TonConnect)
            .await
            .expect("adapter should be registered");
        assert!(std::ptr::eq(
            Arc::as_ptr(&found) as *const (),
            Arc::as_ptr(&adapter) as *const ()
        ));
        assert!(manager.get_adapter(DappProtocolType::WalletConnect).await.is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_first() {
        let manager = DappProtocolManager::new();
        let first = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect));
        let second = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect));
        manager.register_adapter(first.clone()).await;
        manager.register_adapter(second).await;

        manager.init(test_config()).await;
        assert_eq!(first.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn init_isolates_failures() {
        let manager = DappProtocolManager::new();
        let ok = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect));
        let broken = Arc::new(SpyAdapter::new(DappProtocolType::WalletConnect).failing_init());
        manager.register_adapter(ok).await;
        manager.register_adapter(broken).await;

        manager.init(test_config()).await;

        assert!(manager.is_initialized(DappProtocolType::TonConnect).await);
        assert!(!manager.is_initialized(DappProtocolType::WalletConnect).await);
    }

    #[tokio::test]
    async fn second_init_skips_initialized_adapters() {
        let manager = DappProtocolManager::new();
        let adapter = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect));
        manager.register_adapter(adapter.clone()).await;

        manager.init(test_config()).await;
        manager.init(test_config()).await;

        assert_eq!(adapter.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deep_link_goes_to_first_claimant_only() {
        let manager = DappProtocolManager::new();
        let ton = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect).claiming("tc://"));
        let wc = Arc::new(SpyAdapter::new(DappProtocolType::WalletConnect).claiming("wc:"));
        manager.register_adapter(ton.clone()).await;
        manager.register_adapter(wc.clone()).await;
        manager.init(test_config()).await;

        let result = manager
            .handle_deep_link(&DeepLink::new("wc:topic@2?relay-protocol=irn"))
            .await
            .unwrap();

        assert_eq!(result.as_deref(), Some("handled:wc:topic@2?relay-protocol=irn"));
        assert_eq!(ton.deep_link_calls.load(Ordering::SeqCst), 0);
        assert_eq!(wc.deep_link_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unclaimed_deep_link_is_not_an_error() {
        let manager = DappProtocolManager::new();
        let ton = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect).claiming("tc://"));
        manager.register_adapter(ton).await;
        manager.init(test_config()).await;

        let result = manager
            .handle_deep_link(&DeepLink::new("https://unrelated.example"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn deep_link_skips_uninitialized_adapters() {
        let manager = DappProtocolManager::new();
        let ton = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect).claiming("tc://"));
        manager.register_adapter(ton.clone()).await;
        // no init

        let result = manager.handle_deep_link(&DeepLink::new("tc://connect")).await.unwrap();
        assert!(result.is_none());
        assert_eq!(ton.deep_link_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_remote_connection_requires_registered_adapter() {
        let manager = DappProtocolManager::new();
        let result = manager
            .close_remote_connection("acct-1", &stored(Some(DappProtocolType::WalletConnect)))
            .await;
        assert!(matches!(
            result,
            Err(ManagerError::AdapterNotRegistered(DappProtocolType::WalletConnect))
        ));
    }

    #[tokio::test]
    async fn close_remote_connection_defaults_to_primary_protocol() {
        let manager = DappProtocolManager::new();
        let ton = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect));
        manager.register_adapter(ton.clone()).await;

        manager.close_remote_connection("acct-1", &stored(None)).await.unwrap();
        assert_eq!(ton.close_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn destroy_clears_registry() {
        let manager = DappProtocolManager::new();
        manager
            .register_adapter(Arc::new(SpyAdapter::new(DappProtocolType::TonConnect)))
            .await;
        manager.init(test_config()).await;

        manager.destroy().await;
        assert!(manager.get_adapter(DappProtocolType::TonConnect).await.is_none());
    }

    #[tokio::test]
    async fn resetup_without_filter_touches_only_first_registered() {
        // Pins the sequential-scan behavior: with no protocol filter the
        // scan stops at the first initialized registration, so the second
        // adapter is never resetup.
        let manager = DappProtocolManager::new();
        let ton = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect).with_resetup());
        let wc = Arc::new(SpyAdapter::new(DappProtocolType::WalletConnect).with_resetup());
        manager.register_adapter(ton.clone()).await;
        manager.register_adapter(wc.clone()).await;
        manager.init(test_config()).await;

        manager.resetup_remote_connection(None).await;

        assert_eq!(ton.resetup_calls.load(Ordering::SeqCst), 1);
        assert_eq!(wc.resetup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resetup_with_filter_targets_that_protocol() {
        let manager = DappProtocolManager::new();
        let ton = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect).with_resetup());
        let wc = Arc::new(SpyAdapter::new(DappProtocolType::WalletConnect).with_resetup());
        manager.register_adapter(ton.clone()).await;
        manager.register_adapter(wc.clone()).await;
        manager.init(test_config()).await;

        manager
            .resetup_remote_connection(Some(DappProtocolType::WalletConnect))
            .await;

        assert_eq!(ton.resetup_calls.load(Ordering::SeqCst), 0);
        assert_eq!(wc.resetup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resetup_is_a_noop_without_the_capability() {
        let manager = DappProtocolManager::new();
        let ton = Arc::new(SpyAdapter::new(DappProtocolType::TonConnect));
        manager.register_adapter(ton.clone()).await;
        manager.init(test_config()).await;

        // Must not panic or error; the capability is simply absent.
        manager.resetup_remote_connection(None).await;
        assert_eq!(ton.resetup_calls.load(Ordering::SeqCst), 0);
    }
}
