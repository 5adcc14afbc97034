use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use bridge_core::{PermissionOptions, PlatformCapabilities};
use bridge_service::{BridgeOptions, DEFAULT_ACK_LEDGER_CAPACITY, DEFAULT_EVENT_BUFFER};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the listen address.
pub const LISTEN_ENV: &str = "PUSHBRIDGE_LISTEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid listen address {0:?}")]
    InvalidListen(String),
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationConfig {
    #[serde(default = "default_true")]
    pub banner_supported: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    #[serde(flatten)]
    pub options: PermissionOptions,
    /// Answer given to the authorization request on hosts without a prompt.
    #[serde(default = "default_true")]
    pub granted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_ack_ledger_capacity")]
    pub ack_ledger_capacity: usize,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_listen() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_ack_ledger_capacity() -> usize {
    DEFAULT_ACK_LEDGER_CAPACITY
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            banner_supported: true,
        }
    }
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            options: PermissionOptions::all(),
            granted: true,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            ack_ledger_capacity: default_ack_ledger_capacity(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backend: BackendConfig::default(),
            presentation: PresentationConfig::default(),
            permissions: PermissionsConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }
        let content = std::fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("pushbridge")
            .join("config.toml")
    }

    /// Apply environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(listen) = std::env::var(LISTEN_ENV) {
            self.listen = listen;
        }
        self
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(self.listen.clone()))
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            capabilities: PlatformCapabilities {
                banner_supported: self.presentation.banner_supported,
            },
            permissions: self.permissions.options,
            ack_ledger_capacity: self.delivery.ack_ledger_capacity,
        }
    }
}
