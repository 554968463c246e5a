//! Configuration loading and typed config structures for the canvas.
//!
//! The configuration lives in `canvas-config.yaml`. Every field has a
//! default, so a missing file or a partial file is fine. The canvas rules
//! (grid size, round duration, initial grant) are read once at startup and
//! never change while the process runs.

use std::path::Path;

use chrono::TimeDelta;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Largest accepted grid dimension.
pub const MAX_GRID_SIZE: u32 = 1024;

/// Top-level configuration.
///
/// Mirrors the structure of `canvas-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Canvas rules.
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listener:
    /// - `CANVAS_HOST` overrides `server.host`
    /// - `CANVAS_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.server.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.canvas.validate()?;
        if self.server.keepalive_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "server.keepalive_secs must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Canvas rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CanvasConfig {
    /// Grid dimension N; the grid is N x N.
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,

    /// Round length in milliseconds.
    #[serde(default = "default_round_duration_ms")]
    pub round_duration_ms: u64,

    /// Tokens granted at first registration.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: u32,

    /// Seed founding participants and a heart in the centre at startup.
    #[serde(default)]
    pub seed_demo_art: bool,

    /// Per-stream event queue length. A stream that falls this far behind
    /// is dropped and must resynchronise from a snapshot.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            round_duration_ms: default_round_duration_ms(),
            initial_balance: default_initial_balance(),
            seed_demo_art: false,
            event_buffer: default_event_buffer(),
        }
    }
}

impl CanvasConfig {
    /// Round length as a [`TimeDelta`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the duration is zero or does not
    /// fit a [`TimeDelta`].
    pub fn round_duration(&self) -> Result<TimeDelta, ConfigError> {
        let ms = i64::try_from(self.round_duration_ms).map_err(|_err| ConfigError::Invalid {
            reason: format!("round_duration_ms {} is too large", self.round_duration_ms),
        })?;
        if ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "round_duration_ms must be at least 1".to_owned(),
            });
        }
        TimeDelta::try_milliseconds(ms).ok_or_else(|| ConfigError::Invalid {
            reason: format!("round_duration_ms {ms} is out of range"),
        })
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 || self.grid_size > MAX_GRID_SIZE {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "grid_size must be in 1..={MAX_GRID_SIZE}, got {}",
                    self.grid_size
                ),
            });
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::Invalid {
                reason: "event_buffer must be at least 1".to_owned(),
            });
        }
        self.round_duration().map(|_| ())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between keep-alive messages on event streams.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            keepalive_secs: default_keepalive_secs(),
        }
    }
}

impl ServerConfig {
    /// Apply `CANVAS_HOST` / `CANVAS_PORT` overrides if set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `CANVAS_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("CANVAS_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("CANVAS_PORT") {
            self.port = port.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("CANVAS_PORT {port:?}: {e}"),
            })?;
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_grid_size() -> u32 {
    32
}

const fn default_round_duration_ms() -> u64 {
    60_000
}

const fn default_initial_balance() -> u32 {
    5
}

const fn default_event_buffer() -> usize {
    256
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_keepalive_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_owned()
}
