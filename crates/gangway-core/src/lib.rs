//! # Gangway Core
//!
//! Protocol-dispatch and session-lifecycle layer of the Gangway wallet's
//! dApp connection subsystem.
//!
//! A wallet that speaks to dApps has to multiplex several mutually
//! incompatible connection protocols — each with its own message schema,
//! transport (deep link, in-app browser injection, remote relay) and error
//! taxonomy — behind one internal call surface. This crate provides that
//! layer:
//!
//! - **Adapter contract** ([`DappProtocolAdapter`]): one implementation per
//!   protocol, owning its handshake, session records and live transport.
//! - **Method router** ([`route_method`]): classifies every inbound method
//!   name as generic or protocol-scoped, once per call, in O(1).
//! - **Manager** ([`DappProtocolManager`]): adapter registry and lifecycle
//!   orchestrator; routes deep links, fans out init/destroy, and isolates
//!   one protocol's failure from the rest.
//! - **Call surfaces** ([`DirectBinding`], [`ContentScriptBinding`],
//!   [`WorkerBinding`]): thin routers over the same dispatch core for the
//!   three contexts that reach into the subsystem.
//!
//! ```text
//! UI / page script / worker
//!         │  "<protocol>_<method>" | generic name
//!         ▼
//!   call surface ──▶ router ──▶ manager ──▶ adapter (TonConnect, …)
//!                       │
//!                       └─────▶ generic method table
//! ```
//!
//! Collaborators — session storage, chain SDKs, bridge/relay transports —
//! are consumed through traits and injected via [`DappProtocolConfig`];
//! the core performs no I/O of its own.

pub mod adapter;
pub mod config;
pub mod connection;
pub mod error;
pub mod manager;
pub mod protocol;
pub mod request;
pub mod routing;
pub mod surface;

pub use adapter::{BoxedDappAdapter, DappProtocolAdapter, DeepLink, ResetupRemoteConnection};
pub use config::{
    Chain, ChainDappSdk, ChainDappSupport, DappProtocolConfig, DappUpdate, RuntimeEnv, UpdateSink,
};
pub use connection::{
    ChainSession, DappConnectionStore, DappMetadata, MemoryDappConnectionStore, StoredDappConnection,
};
pub use error::{
    AdapterError, AdapterResult, CallError, ManagerError, ProtocolError, ProtocolResult,
    StoreError, StoreResult, TransportError, TransportResult,
};
pub use manager::DappProtocolManager;
pub use protocol::DappProtocolType;
pub use request::{ApiDappRequest, CallSource};
pub use routing::{AdapterMethod, MethodRoute, route_method};
pub use surface::{
    ContentScriptBinding, DirectBinding, GenericHandler, GenericMethodTable, PAGE_ALLOWED_METHODS,
    WorkerBinding, WorkerError, WorkerRequest, WorkerResponse,
};
