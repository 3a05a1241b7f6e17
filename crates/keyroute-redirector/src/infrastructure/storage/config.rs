//! TOML-based configuration for the redirector.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\KeyRoute\config.toml`
//! - Linux:    `~/.config/keyroute/config.toml`
//! - macOS:    `~/Library/Application Support/KeyRoute/config.toml`
//!
//! Example:
//!
//! ```toml
//! [engine]
//! device = "keyboard"
//! escape_key = "Escape"
//! pass_through = false
//!
//! [logging]
//! log_level = "info"
//! ```
//!
//! Every field has a serde default, so a partial file (or none at all) is
//! valid. Values are kept as strings on disk and validated by
//! [`EngineConfig::resolve`].

use std::path::{Path, PathBuf};

use keyroute_core::{parse_key, DeviceClass};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::classify::PassThroughPolicy;
use crate::application::engine::EngineOptions;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A field parsed as TOML but holds a value the engine cannot use.
    #[error("invalid value {value:?} for {field}")]
    InvalidValue { field: &'static str, value: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// `"keyboard"` or `"mouse"`.
    #[serde(default = "default_device")]
    pub device: String,
    /// Key name or hex virtual-key code that disarms the hook.
    #[serde(default = "default_escape_key")]
    pub escape_key: String,
    /// `false` swallows input while targets are bound; `true` lets it through.
    #[serde(default)]
    pub pass_through: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_device() -> String {
    "keyboard".to_string()
}
fn default_escape_key() -> String {
    "Escape".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            escape_key: default_escape_key(),
            pass_through: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Validates the string fields and converts them into engine inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown device name, an
    /// `"unset"` device, or an unparseable escape key.
    pub fn resolve(&self) -> Result<(DeviceClass, EngineOptions), ConfigError> {
        let device = self
            .device
            .parse::<DeviceClass>()
            .ok()
            .filter(|d| d.is_set())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "engine.device",
                value: self.device.clone(),
            })?;

        let escape_vk = parse_key(&self.escape_key).map_err(|_| ConfigError::InvalidValue {
            field: "engine.escape_key",
            value: self.escape_key.clone(),
        })?;

        let pass_through = if self.pass_through {
            PassThroughPolicy::PassThrough
        } else {
            PassThroughPolicy::SuppressWhileBound
        };

        Ok((
            device,
            EngineOptions {
                escape_vk,
                pass_through,
            },
        ))
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory plus the `KeyRoute`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("KeyRoute"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keyroute"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("KeyRoute")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
