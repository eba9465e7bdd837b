//! Call-surface bindings.
//!
//! Three entry points share one routing pattern: receive a method name and
//! arguments, classify the name, and either forward to the owning adapter or
//! look the name up in the generic method table. They differ only in trust
//! level and transport:
//!
//! - [`DirectBinding`] — same-process calls from wallet code.
//! - [`ContentScriptBinding`] — extension content-script bridge; enforces an
//!   allow-list and injects the verified page origin.
//! - [`WorkerBinding`] — background-worker message bridge with
//!   serde-serializable request/response envelopes.

mod content_script;
mod direct;
mod table;
mod worker;

pub use content_script::{ContentScriptBinding, PAGE_ALLOWED_METHODS};
pub use direct::DirectBinding;
pub use table::{GenericHandler, GenericMethodTable};
pub use worker::{WorkerBinding, WorkerError, WorkerRequest, WorkerResponse};

use serde_json::Value;

use crate::error::CallError;
use crate::manager::DappProtocolManager;
use crate::request::ApiDappRequest;
use crate::routing::{MethodRoute, route_method};

/// Shared routing core of all three bindings.
///
/// Protocol-scoped calls resolve the adapter — a missing adapter for a
/// recognized protocol is a hard error, never a silent no-op — and forward
/// the caller's arguments in order, unmodified. Generic calls consult the
/// method table.
pub(crate) async fn dispatch(
    manager: &DappProtocolManager,
    table: &GenericMethodTable,
    request: ApiDappRequest,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, CallError> {
    match route_method(name) {
        MethodRoute::Adapter { protocol, method } => {
            let adapter = manager
                .get_adapter(protocol)
                .await
                .ok_or(CallError::AdapterNotRegistered(protocol))?;
            Ok(adapter.call(request, method, args).await?)
        }
        MethodRoute::AdapterUnknown { .. } => Err(CallError::UnknownMethod(name.to_owned())),
        MethodRoute::Generic { name } => {
            let handler = table
                .get(name)
                .ok_or_else(|| CallError::UnknownMethod(name.to_owned()))?;
            handler(request, args).await
        }
    }
}
