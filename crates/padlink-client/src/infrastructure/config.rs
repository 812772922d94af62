//! TOML-based settings persistence for the Padlink client.
//!
//! Reads and writes [`Settings`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Padlink\config.toml`
//! - Linux:    `~/.config/padlink/config.toml` (or `$XDG_CONFIG_HOME/padlink`)
//! - macOS:    `~/Library/Application Support/Padlink/config.toml`
//!
//! ```toml
//! [session]
//! host = "192.168.1.20"
//! port = 64296
//! sensitivity = 1.5
//!
//! [connection]
//! heartbeat_interval_ms = 3000
//!
//! [log]
//! level = "debug"
//! ```
//!
//! Every field has a `#[serde(default = "...")]` helper, so a file may set
//! only the values it cares about, and a missing file means "all defaults".

use std::path::{Path, PathBuf};
use std::time::Duration;

use padlink_core::SessionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::network::{ConnectionConfig, ConnectionConfigError};

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized to TOML.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The settings parsed but describe an unusable session.
    #[error("invalid settings: {0}")]
    Invalid(#[from] padlink_core::ConfigError),

    /// The settings parsed but the connection timing is unusable.
    #[error("invalid connection settings: {0}")]
    InvalidConnection(#[from] ConnectionConfigError),
}

// ── Settings schema ───────────────────────────────────────────────────────────

/// Top-level settings stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// Touchpad and target-host preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// Host name or IP address of the receiving daemon.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_tap_delay_ms")]
    pub tap_delay_ms: u64,
    #[serde(default = "default_tap_tolerance_px")]
    pub tap_tolerance_px: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    /// 1.0 disables acceleration.
    #[serde(default = "default_acceleration_exponent")]
    pub acceleration_exponent: f32,
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f32,
}

/// Heartbeat and connect timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionSettings {
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSettings {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    64296
}
fn default_tap_delay_ms() -> u64 {
    200
}
fn default_tap_tolerance_px() -> f32 {
    10.0
}
fn default_sensitivity() -> f32 {
    1.0
}
fn default_acceleration_exponent() -> f32 {
    1.0
}
fn default_scroll_threshold() -> f32 {
    20.0
}
fn default_heartbeat_interval_ms() -> u64 {
    3000
}
fn default_connect_timeout_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tap_delay_ms: default_tap_delay_ms(),
            tap_tolerance_px: default_tap_tolerance_px(),
            sensitivity: default_sensitivity(),
            acceleration_exponent: default_acceleration_exponent(),
            scroll_threshold: default_scroll_threshold(),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// The immutable snapshot handed to the core, validated.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] if any session value is unusable.
    pub fn session_config(&self) -> Result<SessionConfig, SettingsError> {
        let s = &self.session;
        let config = SessionConfig {
            host: s.host.clone(),
            port: s.port,
            tap_delay_ms: s.tap_delay_ms,
            tap_tolerance_px: s.tap_tolerance_px,
            sensitivity: s.sensitivity,
            acceleration_exponent: s.acceleration_exponent,
            scroll_threshold: s.scroll_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// The connection manager's configuration, validated.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidConnection`] for a zero heartbeat
    /// interval or connect timeout.
    pub fn connection_config(&self) -> Result<ConnectionConfig, SettingsError> {
        let config = ConnectionConfig {
            host: self.session.host.clone(),
            port: self.session.port,
            heartbeat_interval: Duration::from_millis(self.connection.heartbeat_interval_ms),
            connect_timeout: Duration::from_millis(self.connection.connect_timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

// ── Settings repository ───────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the settings file.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, SettingsError> {
    platform_config_dir().ok_or(SettingsError::NoPlatformConfigDir)
}

/// Resolves the full path to the default settings file.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, SettingsError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads settings from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not
/// found", and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `settings` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system failures or
/// [`SettingsError::Serialize`] if serialization fails.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `Padlink` component.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Padlink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Padlink")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("padlink"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
