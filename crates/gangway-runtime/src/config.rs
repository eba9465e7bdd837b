//! Process configuration, loaded via figment.
//!
//! Sources are layered, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A `gangway.toml` file (current directory, or an explicit path)
//! 3. `GANGWAY_`-prefixed environment variables, with `__` as the section
//!    separator: `GANGWAY_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use gangway_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load()?;
//! gangway_runtime::logging::init_from_config(&config.logging);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Serialized};
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use gangway_core::{DappProtocolType, RuntimeEnv};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Schema
// =============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GangwayConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Application identity, echoed to dApps as device info.
    #[serde(default)]
    pub app: AppConfig,

    /// Per-protocol enablement.
    #[serde(default)]
    pub protocols: ProtocolsConfig,
}

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug information.
    Debug,
    /// Normal operation (default).
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// String form, as used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line compact output (default).
    #[default]
    Compact,
    /// Standard multi-field output.
    Full,
    /// Multi-line human-oriented output.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Per-module level overrides (`module → level`).
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

/// Application identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Platform tag (e.g. `"ios"`, `"android"`, `"chrome-extension"`).
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Wallet application name.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Wallet application version.
    #[serde(default = "default_app_version")]
    pub version: String,

    /// Whether the wallet runs as a browser extension.
    #[serde(default)]
    pub is_extension: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            name: default_app_name(),
            version: default_app_version(),
            is_extension: false,
        }
    }
}

fn default_platform() -> String {
    "unknown".to_owned()
}

fn default_app_name() -> String {
    "Gangway".to_owned()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}

impl AppConfig {
    /// Converts to the runtime environment descriptor shared with adapters.
    pub fn runtime_env(&self) -> RuntimeEnv {
        RuntimeEnv {
            platform: self.platform.clone(),
            app_name: self.name.clone(),
            app_version: self.version.clone(),
            is_extension: self.is_extension,
        }
    }
}

/// Enablement switch for one protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Whether the protocol's adapter is registered at bootstrap.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Per-protocol enablement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolsConfig {
    /// TonConnect protocol.
    #[serde(default, alias = "tonconnect")]
    pub ton_connect: ProtocolConfig,

    /// WalletConnect protocol.
    #[serde(default, alias = "walletconnect")]
    pub wallet_connect: ProtocolConfig,
}

impl ProtocolsConfig {
    /// Whether the given protocol is enabled.
    pub fn is_enabled(&self, protocol: DappProtocolType) -> bool {
        match protocol {
            DappProtocolType::TonConnect => self.ton_connect.enabled,
            DappProtocolType::WalletConnect => self.wallet_connect.enabled,
        }
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Configuration loader with figment-based multi-source support.
///
/// # Example
///
/// ```rust,ignore
/// let config = ConfigLoader::new()
///     .file("./config/gangway.toml")
///     .load()?;
/// ```
pub struct ConfigLoader {
    figment: Figment,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader with defaults: search `gangway.toml` in the current
    /// directory, then apply `GANGWAY_` environment variables.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets a specific configuration file to load instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically, overriding file
    /// defaults but not environment variables.
    pub fn merge(mut self, config: GangwayConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<GangwayConfig> {
        let figment = self.build_figment()?;
        let config: GangwayConfig = figment
            .extract()
            .map_err(|err| ConfigError::Parse(err.to_string()))?;

        debug!(
            logging_level = %config.logging.level,
            ton_connect = config.protocols.ton_connect.enabled,
            wallet_connect = config.protocols.wallet_connect.enabled,
            "configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(GangwayConfig::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = Self::search_config_file(figment);
        }

        if self.load_env {
            figment = figment.merge(
                Env::prefixed("GANGWAY_")
                    .split("__")
                    .map(|key| key.as_str().replace("__", ".").into()),
            );
        }

        Ok(figment)
    }

    #[cfg(feature = "toml-config")]
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        Ok(figment.merge(Toml::file(path)))
    }

    #[cfg(not(feature = "toml-config"))]
    fn merge_config_file(_figment: Figment, path: &Path) -> ConfigResult<Figment> {
        Err(ConfigError::Parse(format!(
            "configuration file support is disabled (enable the `toml-config` feature): {}",
            path.display()
        )))
    }

    fn search_config_file(figment: Figment) -> Figment {
        #[cfg(feature = "toml-config")]
        if let Ok(cwd) = std::env::current_dir() {
            let candidate = cwd.join("gangway.toml");
            if candidate.exists() {
                info!(path = %candidate.display(), "loading configuration file");
                return figment.merge(Toml::file(candidate));
            }
        }
        warn!("no configuration file found, using defaults");
        figment
    }
}

// =============================================================================
// Tests
// =============================================================================
