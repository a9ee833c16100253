//! Engine configuration
//!
//! This module handles the persistent configuration for the engine:
//! transport endpoint and topic, durable-store settings, and display
//! defaults such as the initial window duration.
//!
//! Configuration is stored as TOML in the platform-appropriate config
//! directory under `dev.hxyulin.sensorvis-rs`:
//!
//! - **Linux**: `~/.config/dev.hxyulin.sensorvis-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.sensorvis-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.hxyulin.sensorvis-rs\config.toml`
//!
//! The step interval, save interval and health thresholds are fixed
//! constants (see [`crate::types`]), not configuration.

use crate::error::{EngineError, Result};
use crate::types::WindowDuration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier used for the config directory
pub const APP_ID: &str = "dev.hxyulin.sensorvis-rs";

/// Config file name within the app config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the application config directory path
pub fn app_config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app config directory exists
pub fn ensure_app_config_dir() -> Result<PathBuf> {
    let dir = app_config_dir()
        .ok_or_else(|| EngineError::Config("Could not determine config directory".to_string()))?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .map_err(|e| EngineError::Config(format!("Failed to create config directory: {}", e)))?;
    }

    Ok(dir)
}

/// Transport (pub/sub) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Broker endpoint URL
    #[serde(default = "default_broker_url")]
    pub broker_url: String,

    /// Topic carrying the sensor readings
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_broker_url() -> String {
    "wss://broker.hivemq.com:8884/mqtt".to_string()
}

fn default_topic() -> String {
    "jetson/box/sensor".to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            broker_url: default_broker_url(),
            topic: default_topic(),
        }
    }
}

/// Durable store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store endpoint URL (empty = no remote store configured)
    #[serde(default)]
    pub url: String,

    /// Table holding the persisted readings
    #[serde(default = "default_store_table")]
    pub table: String,
}

fn default_store_table() -> String {
    "sensor_logs".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            table: default_store_table(),
        }
    }
}

/// Display defaults consumed by the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Initial window duration
    #[serde(default)]
    pub window_duration: WindowDuration,

    /// Trailing look-back count for the moving average
    #[serde(default = "default_trend_lookback")]
    pub trend_lookback: usize,
}

fn default_trend_lookback() -> usize {
    crate::types::TREND_LOOKBACK
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_duration: WindowDuration::default(),
            trend_lookback: default_trend_lookback(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Transport settings
    #[serde(default)]
    pub transport: TransportConfig,

    /// Durable store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Display defaults
    #[serde(default)]
    pub display: DisplayConfig,
}

impl EngineConfig {
    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EngineError::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = app_config_dir().map(|p| p.join(CONFIG_FILE)) else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| EngineError::Config(format!("Failed to write config: {}", e)))
    }

    /// Save configuration to the default location
    pub fn save_default(&self) -> Result<()> {
        let dir = ensure_app_config_dir()?;
        self.save(dir.join(CONFIG_FILE))
    }
}
