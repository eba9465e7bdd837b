//! Gangway Runtime - bootstrap layer for the dApp connection subsystem.
//!
//! This crate provides:
//! - Process configuration ([`GangwayConfig`], [`ConfigLoader`]) loaded from
//!   `gangway.toml` and `GANGWAY_`-prefixed environment variables
//! - Logging setup ([`LoggingBuilder`], [`logging::init_from_config`])
//! - Service assembly ([`DappServiceBuilder`], [`DappService`],
//!   [`ServiceCell`]): the explicit once-per-process construction of the
//!   manager, adapters and call-surface bindings
//!
//! ```ignore
//! use gangway_runtime::{ConfigLoader, DappServiceBuilder, logging};
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//!
//! let service = DappServiceBuilder::new()
//!     .env(config.app.runtime_env())
//!     .protocols(config.protocols.clone())
//!     .adapter(tonconnect_adapter)
//!     .adapter(walletconnect_adapter)
//!     .build()
//!     .await;
//! service.init().await;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod service;

pub use config::{
    AppConfig, ConfigLoader, GangwayConfig, LogFormat, LogLevel, LoggingConfig, ProtocolConfig,
    ProtocolsConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use logging::LoggingBuilder;
pub use service::{DappService, DappServiceBuilder, FlushHook, ServiceCell};

// Re-export tracing for use by embedders
pub use tracing;
