//! TOML-based service configuration.

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::devices::scalar::{DEFAULT_DECAY_RATE, DEFAULT_INITIAL_LEVEL};

/// Top-level configuration parsed from TOML.
///
/// All sections have defaults. Load from TOML with
/// [`AppConfig::from_toml_file`] or start from [`AppConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Listen address and port.
    #[serde(default)]
    pub server: ServerConfig,
    /// Fuel level sensor parameters.
    #[serde(default)]
    pub fuel: FuelConfig,
    /// Streaming session parameters.
    #[serde(default)]
    pub stream: StreamConfig,
    /// Log filter.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// IP address to bind.
    pub address: String,
    /// TCP port to bind (must be > 0).
    pub port: u16,
    /// Vehicle reported when a request names none.
    pub vehicle_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 50051,
            vehicle_id: "VIN123456789".to_string(),
        }
    }
}

/// Fuel level sensor parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FuelConfig {
    /// Starting level in percent; clamped into `[0, 100]`.
    pub initial_level: f32,
    /// Level consumed per read (must be >= 0).
    pub decay_rate: f32,
    /// Noise seed; unset seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            initial_level: DEFAULT_INITIAL_LEVEL,
            decay_rate: DEFAULT_DECAY_RATE,
            seed: None,
        }
    }
}

/// Streaming session parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    /// Length of one requested interval unit in milliseconds.
    pub interval_unit_ms: u64,
    /// Maximum concurrent streaming sessions.
    pub max_sessions: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_unit_ms: 1000,
            max_sessions: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"server.port"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Upper bound on `stream.max_sessions`; each session holds a task.
pub const MAX_STREAM_SESSIONS: usize = 4096;

impl AppConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Resolves the listen address.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `server.address` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.server.address.parse().map_err(|_| {
            ConfigError::new(
                "server.address",
                format!("\"{}\" is not an IP address", self.server.address),
            )
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.socket_addr() {
            errors.push(e);
        }
        if self.server.port == 0 {
            errors.push(ConfigError::new("server.port", "must be > 0"));
        }
        if self.server.vehicle_id.trim().is_empty() {
            errors.push(ConfigError::new("server.vehicle_id", "must not be empty"));
        }

        let fuel = &self.fuel;
        if !fuel.initial_level.is_finite() {
            errors.push(ConfigError::new("fuel.initial_level", "must be finite"));
        }
        if !fuel.decay_rate.is_finite() || fuel.decay_rate < 0.0 {
            errors.push(ConfigError::new("fuel.decay_rate", "must be finite and >= 0"));
        }

        if self.stream.interval_unit_ms == 0 {
            errors.push(ConfigError::new("stream.interval_unit_ms", "must be > 0"));
        }
        if self.stream.max_sessions == 0 {
            errors.push(ConfigError::new("stream.max_sessions", "must be > 0"));
        } else if self.stream.max_sessions > MAX_STREAM_SESSIONS {
            errors.push(ConfigError::new(
                "stream.max_sessions",
                format!("must be <= {MAX_STREAM_SESSIONS}"),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ConfigError::new(
                "logging.level",
                format!(
                    "must be one of {}, got \"{}\"",
                    LOG_LEVELS.join(", "),
                    self.logging.level
                ),
            ));
        }

        errors
    }
}
