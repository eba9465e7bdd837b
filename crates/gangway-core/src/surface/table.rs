//! Generic (non-protocol) method table.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::warn;

use crate::error::CallError;
use crate::request::ApiDappRequest;

/// A boxed async handler for one generic method.
pub type GenericHandler =
    Arc<dyn Fn(ApiDappRequest, Vec<Value>) -> BoxFuture<'static, Result<Value, CallError>> + Send + Sync>;

/// Name-to-handler table for generic methods.
///
/// Populated once at bootstrap; lookups are synchronous and lock-cheap
/// since they happen on every non-protocol call.
#[derive(Default)]
pub struct GenericMethodTable {
    methods: RwLock<HashMap<String, GenericHandler>>,
}

impl GenericMethodTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under a method name.
    ///
    /// Re-registering a name replaces the handler and logs a warning;
    /// bootstrap code is expected to register each name once.
    pub fn register<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(ApiDappRequest, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CallError>> + Send + 'static,
    {
        let name = name.into();
        let boxed: GenericHandler = Arc::new(move |request, args| Box::pin(handler(request, args)));
        if self.methods.write().insert(name.clone(), boxed).is_some() {
            warn!(method = %name, "generic method re-registered, replacing handler");
        }
    }

    /// Looks up a handler.
    pub fn get(&self, name: &str) -> Option<GenericHandler> {
        self.methods.read().get(name).cloned()
    }

    /// Registered method names, for diagnostics.
    pub fn names(&self) -> Vec<String> {
        self.methods.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_handler_is_invoked() {
        let table = GenericMethodTable::new();
        table.register("ping", |_request, args| async move {
            Ok(Value::from(format!("pong:{}", args.len())))
        });

        let handler = table.get("ping").expect("handler registered");
        let result = handler(ApiDappRequest::internal(), vec![Value::Null]).await.unwrap();
        assert_eq!(result, Value::from("pong:1"));
    }

    #[test]
    fn missing_handler_is_none() {
        let table = GenericMethodTable::new();
        assert!(table.get("nope").is_none());
    }
}
