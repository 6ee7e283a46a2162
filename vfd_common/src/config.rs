//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! for the VFD link, plus the spindle and serial-link configuration tables
//! themselves.
//!
//! # Usage
//!
//! ```rust,no_run
//! use vfd_common::config::{ConfigLoader, VfdLinkConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), vfd_common::config::ConfigError> {
//!     let config = VfdLinkConfig::load(Path::new("config.toml"))?;
//!     config.validate()?;
//!     println!("Bus address: {}", config.link.bus_address);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::consts::{
    DEFAULT_BAUD_RATE, DEFAULT_BUS_ADDRESS, MAX_RETRIES, POLL_INTERVAL, RESPONSE_WAIT,
};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

/// Common configuration fields shared by all link applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Serial Link Settings ───────────────────────────────────────────

/// Parity setting for the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    /// No parity bit (the common drive default).
    #[default]
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
}

/// Half-duplex serial bus parameters.
///
/// Defaults are 9600 8N1, which is sane for most drives.
///
/// # TOML Example
///
/// ```toml
/// [link]
/// device = "/dev/ttyUSB1"
/// baud_rate = 19200
/// parity = "even"
/// bus_address = 2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSettings {
    /// Serial device path. Required; empty means the link is not wired up.
    pub device: String,

    /// Baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Data bits (5-8).
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,

    /// Stop bits (1-2).
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,

    /// Parity.
    #[serde(default)]
    pub parity: Parity,

    /// Device address shared by all frames on the bus.
    #[serde(default = "default_bus_address")]
    pub bus_address: u8,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}
fn default_data_bits() -> u8 {
    8
}
fn default_stop_bits() -> u8 {
    1
}
fn default_bus_address() -> u8 {
    DEFAULT_BUS_ADDRESS
}

impl LinkSettings {
    /// Validate the link parameters.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if:
    /// - `device` is empty
    /// - `bus_address` is outside the addressable range 1-247
    /// - `data_bits` / `stop_bits` are out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.is_empty() {
            return Err(ConfigError::ValidationError(
                "link device path is not set".to_string(),
            ));
        }
        if self.bus_address == 0 || self.bus_address > 247 {
            return Err(ConfigError::ValidationError(format!(
                "bus_address {} outside 1-247",
                self.bus_address
            )));
        }
        if !(5..=8).contains(&self.data_bits) {
            return Err(ConfigError::ValidationError(format!(
                "data_bits {} outside 5-8",
                self.data_bits
            )));
        }
        if !(1..=2).contains(&self.stop_bits) {
            return Err(ConfigError::ValidationError(format!(
                "stop_bits {} outside 1-2",
                self.stop_bits
            )));
        }
        Ok(())
    }
}

// ─── Spindle Settings ───────────────────────────────────────────────

/// Spindle behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpindleConfig {
    /// Vendor profile name (registry key), e.g. "generic".
    #[serde(default = "default_vendor")]
    pub vendor: String,

    /// Lowest usable RPM; nonzero requests below this are raised to it.
    #[serde(default)]
    pub min_rpm: u32,

    /// Highest usable RPM; seeds the clamp window until capability
    /// discovery reads the real value from the device.
    #[serde(default = "default_max_rpm")]
    pub max_rpm: u32,

    /// Mechanical settling pause after enabling the spindle [ms].
    #[serde(default = "default_spinup_dwell_ms")]
    pub spinup_dwell_ms: u64,

    /// Mechanical settling pause after disabling the spindle [ms].
    #[serde(default = "default_spindown_dwell_ms")]
    pub spindown_dwell_ms: u64,

    /// Pause between bus transactions [ms].
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Reply deadline per transaction attempt [ms].
    #[serde(default = "default_response_wait_ms")]
    pub response_wait_ms: u64,

    /// Attempts per envelope before the device is declared unresponsive.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Laser mode is incompatible with a bus-controlled spindle; when the
    /// machine is configured for laser mode, link init must fail.
    #[serde(default)]
    pub laser_mode: bool,
}

fn default_vendor() -> String {
    "generic".to_string()
}
fn default_max_rpm() -> u32 {
    24_000
}
fn default_spinup_dwell_ms() -> u64 {
    1_000
}
fn default_spindown_dwell_ms() -> u64 {
    2_000
}
fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL.as_millis() as u64
}
fn default_response_wait_ms() -> u64 {
    RESPONSE_WAIT.as_millis() as u64
}
fn default_max_retries() -> u32 {
    MAX_RETRIES
}

impl SpindleConfig {
    /// Validate the spindle parameters.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if:
    /// - `vendor` is empty
    /// - `max_rpm` is zero
    /// - `laser_mode` is set (bus spindle and laser mode are exclusive)
    /// - retry/poll settings are zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vendor.is_empty() {
            return Err(ConfigError::ValidationError(
                "vendor profile name cannot be empty".to_string(),
            ));
        }
        if self.max_rpm == 0 {
            return Err(ConfigError::ValidationError(
                "max_rpm must be nonzero".to_string(),
            ));
        }
        if self.laser_mode {
            return Err(ConfigError::ValidationError(
                "bus spindle disabled in laser mode; turn laser mode off and restart".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "max_retries must be nonzero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    /// Pause between bus transactions.
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reply deadline per transaction attempt.
    #[inline]
    pub fn response_wait(&self) -> Duration {
        Duration::from_millis(self.response_wait_ms)
    }

    /// Settling pause after enabling.
    #[inline]
    pub fn spinup_dwell(&self) -> Duration {
        Duration::from_millis(self.spinup_dwell_ms)
    }

    /// Settling pause after disabling.
    #[inline]
    pub fn spindown_dwell(&self) -> Duration {
        Duration::from_millis(self.spindown_dwell_ms)
    }
}

impl Default for SpindleConfig {
    fn default() -> Self {
        Self {
            vendor: default_vendor(),
            min_rpm: 0,
            max_rpm: default_max_rpm(),
            spinup_dwell_ms: default_spinup_dwell_ms(),
            spindown_dwell_ms: default_spindown_dwell_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            response_wait_ms: default_response_wait_ms(),
            max_retries: default_max_retries(),
            laser_mode: false,
        }
    }
}

// ─── Application Config ─────────────────────────────────────────────

/// Top-level configuration for a link application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VfdLinkConfig {
    /// Shared service fields.
    pub shared: SharedConfig,
    /// Serial link parameters.
    pub link: LinkSettings,
    /// Spindle behaviour.
    #[serde(default)]
    pub spindle: SpindleConfig,
}

impl VfdLinkConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.link.validate()?;
        self.spindle.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
/// - Returns `ConfigError::ValidationError` if semantic validation fails
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
