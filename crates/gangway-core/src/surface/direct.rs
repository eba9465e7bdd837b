//! Same-process call binding.

use std::sync::Arc;

use serde_json::Value;

use crate::error::CallError;
use crate::manager::DappProtocolManager;
use crate::request::ApiDappRequest;
use crate::surface::{GenericMethodTable, dispatch};

/// Entry point for trusted, same-process callers (wallet UI, internal code).
#[derive(Clone)]
pub struct DirectBinding {
    manager: Arc<DappProtocolManager>,
    table: Arc<GenericMethodTable>,
}

impl DirectBinding {
    /// Creates the binding.
    pub fn new(manager: Arc<DappProtocolManager>, table: Arc<GenericMethodTable>) -> Self {
        Self { manager, table }
    }

    /// Invokes a method by wire name with positional arguments.
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, CallError> {
        dispatch(&self.manager, &self.table, ApiDappRequest::internal(), name, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{DappProtocolAdapter, DeepLink};
    use crate::config::DappProtocolConfig;
    use crate::connection::StoredDappConnection;
    use crate::error::{AdapterResult, ProtocolError, ProtocolResult};
    use crate::protocol::DappProtocolType;
    use crate::routing::AdapterMethod;

    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct EchoAdapter {
        seen: Mutex<Vec<(AdapterMethod, Vec<Value>)>>,
    }

    impl EchoAdapter {
        fn new() -> Self {
            Self { seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl DappProtocolAdapter for EchoAdapter {
        fn protocol_type(&self) -> DappProtocolType {
            DappProtocolType::TonConnect
        }

        async fn init(&self, _config: Arc<DappProtocolConfig>) -> AdapterResult<()> {
            Ok(())
        }

        async fn destroy(&self) -> AdapterResult<()> {
            Ok(())
        }

        fn can_handle_deep_link(&self, _url: &str) -> bool {
            false
        }

        async fn handle_deep_link(&self, _link: &DeepLink) -> ProtocolResult<Option<String>> {
            Ok(None)
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
            method: AdapterMethod,
            args: Vec<Value>,
        ) -> ProtocolResult<Value> {
            self.seen.lock().unwrap().push((method, args.clone()));
            Ok(Value::Array(args))
        }
    }

    async fn binding_with_adapter() -> (DirectBinding, Arc<EchoAdapter>) {
        let manager = Arc::new(DappProtocolManager::new());
        let adapter = Arc::new(EchoAdapter::new());
        manager.register_adapter(adapter.clone()).await;
        let table = Arc::new(GenericMethodTable::new());
        (DirectBinding::new(manager, table), adapter)
    }

    #[tokio::test]
    async fn forwards_arguments_in_order_unmodified() {
        let (binding, adapter) = binding_with_adapter().await;
        let args = vec![json!({"accountId": "acct-1"}), json!("second"), json!(3)];

        let result = binding.call("tonConnect_connect", args.clone()).await.unwrap();

        assert_eq!(result, Value::Array(args.clone()));
        let seen = adapter.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, AdapterMethod::Connect);
        assert_eq!(seen[0].1, args);
    }

    #[tokio::test]
    async fn missing_adapter_is_a_hard_error() {
        let manager = Arc::new(DappProtocolManager::new());
        let binding = DirectBinding::new(manager, Arc::new(GenericMethodTable::new()));

        let result = binding.call("walletConnect_connect", Vec::new()).await;
        assert!(matches!(
            result,
            Err(CallError::AdapterNotRegistered(DappProtocolType::WalletConnect))
        ));
    }

    #[tokio::test]
    async fn generic_method_goes_through_the_table() {
        let manager = Arc::new(DappProtocolManager::new());
        let table = Arc::new(GenericMethodTable::new());
        table.register("flushMemoryCache", |_request, _args| async move { Ok(Value::Null) });
        let binding = DirectBinding::new(manager, table);

        let result = binding.call("flushMemoryCache", Vec::new()).await.unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn unknown_names_are_rejected() {
        let (binding, _adapter) = binding_with_adapter().await;

        assert!(matches!(
            binding.call("definitelyMissing", Vec::new()).await,
            Err(CallError::UnknownMethod(_))
        ));
        // Recognized prefix, unknown suffix.
        assert!(matches!(
            binding.call("tonConnect_eval", Vec::new()).await,
            Err(CallError::UnknownMethod(_))
        ));
    }

    #[tokio::test]
    async fn protocol_errors_pass_through_untouched() {
        struct FailingAdapter;

        #[async_trait]
        impl DappProtocolAdapter for FailingAdapter {
            fn protocol_type(&self) -> DappProtocolType {
                DappProtocolType::WalletConnect
            }
            async fn init(&self, _config: Arc<DappProtocolConfig>) -> AdapterResult<()> {
                Ok(())
            }
            async fn destroy(&self) -> AdapterResult<()> {
                Ok(())
            }
            fn can_handle_deep_link(&self, _url: &str) -> bool {
                false
            }
            async fn handle_deep_link(&self, _link: &DeepLink) -> ProtocolResult<Option<String>> {
                Ok(None)
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
                _args: Vec<Value>,
            ) -> ProtocolResult<Value> {
                Err(ProtocolError::new(4001, "user rejected").with_display("Request was rejected"))
            }
        }

        let manager = Arc::new(DappProtocolManager::new());
        manager.register_adapter(Arc::new(FailingAdapter)).await;
        let binding = DirectBinding::new(manager, Arc::new(GenericMethodTable::new()));

        match binding.call("walletConnect_sendTransaction", Vec::new()).await {
            Err(CallError::Protocol(err)) => {
                assert_eq!(err.code, 4001);
                assert_eq!(err.display.as_deref(), Some("Request was rejected"));
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }
}
