//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::series::OverlapPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sth: SthConfig,

    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream STH (Short Term History) endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SthConfig {
    #[serde(default = "default_sth_url")]
    pub base_url: String,

    #[serde(default = "default_service")]
    pub service: String,

    #[serde(default = "default_service_path")]
    pub service_path: String,

    #[serde(default = "default_entity_type")]
    pub entity_type: String,

    #[serde(default = "default_entity_id")]
    pub entity_id: String,

    #[serde(default = "default_attribute")]
    pub attribute: String,

    #[serde(default = "default_last_n")]
    pub last_n: usize,

    /// No timeout unless set
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_sth_url() -> String {
    "http://localhost:8666".to_string()
}

fn default_service() -> String {
    "smart".to_string()
}

fn default_service_path() -> String {
    "/".to_string()
}

fn default_entity_type() -> String {
    "Lamp".to_string()
}

fn default_entity_id() -> String {
    "urn:ngsi-ld:Lamp:001".to_string()
}

fn default_attribute() -> String {
    "luminosity".to_string()
}

fn default_last_n() -> usize {
    10
}

impl Default for SthConfig {
    fn default() -> Self {
        Self {
            base_url: default_sth_url(),
            service: default_service(),
            service_path: default_service_path(),
            entity_type: default_entity_type(),
            entity_id: default_entity_id(),
            attribute: default_attribute(),
            last_n: default_last_n(),
            request_timeout_secs: None,
        }
    }
}

/// Poll loop and series store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub overlap: OverlapPolicy,

    /// Unbounded when unset
    #[serde(default)]
    pub max_points: Option<usize>,
}

fn default_interval() -> u64 {
    10
}

fn default_timezone() -> String {
    "Europe/Lisbon".to_string()
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timezone: default_timezone(),
            overlap: OverlapPolicy::default(),
            max_points: None,
        }
    }
}

impl PollerConfig {
    /// Resolve the configured IANA timezone name
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone '{}'", self.timezone)))
    }
}

/// Dashboard web server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_title")]
    pub title: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8050
}

fn default_title() -> String {
    "Luminosity Data Viewer".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            title: default_title(),
        }
    }
}

impl DashboardConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// A config file that exists but cannot be read or parsed is an error,
    /// not a reason to fall back to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_first(&default_config_paths())
    }

    /// Load the first existing file in `paths`, or defaults when none exists
    pub fn load_first(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => {
                let config = Self::load_with_env(path)?;
                tracing::info!("Loaded config from {:?}", path);
                Ok(config)
            }
            None => {
                tracing::info!("Using default config with environment overrides");
                Ok(Self::from_env())
            }
        }
    }

    /// Reject values the poller and store cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sth.last_n == 0 {
            return Err(ConfigError::Invalid("sth.last_n must be at least 1".into()));
        }
        if self.poller.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poller.interval_secs must be at least 1".into(),
            ));
        }
        if self.poller.max_points == Some(0) {
            return Err(ConfigError::Invalid(
                "poller.max_points must be at least 1 when set".into(),
            ));
        }
        self.poller.tz()?;
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // STH overrides
        if let Ok(url) = std::env::var("LUMINOSITY_STH_URL") {
            self.sth.base_url = url;
        }
        if let Ok(last_n) = std::env::var("LUMINOSITY_LAST_N") {
            if let Ok(n) = last_n.parse() {
                self.sth.last_n = n;
            }
        }

        // Poller overrides
        if let Ok(interval) = std::env::var("LUMINOSITY_POLL_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.poller.interval_secs = secs;
            }
        }
        if let Ok(tz) = std::env::var("LUMINOSITY_TIMEZONE") {
            self.poller.timezone = tz;
        }

        // Dashboard overrides
        if let Ok(host) = std::env::var("LUMINOSITY_HOST") {
            self.dashboard.host = host;
        }
        if let Ok(port) = std::env::var("LUMINOSITY_PORT") {
            if let Ok(p) = port.parse() {
                self.dashboard.port = p;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("LUMINOSITY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LUMINOSITY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Config file locations, in search order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("luminosity-viewer").join("config.toml"));
    }
    paths.push(PathBuf::from("/etc/luminosity-viewer/config.toml"));
    paths.push(PathBuf::from("./config.toml"));
    paths
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Luminosity Viewer Configuration
#
# Environment variables override these settings:
# - LUMINOSITY_STH_URL
# - LUMINOSITY_LAST_N
# - LUMINOSITY_POLL_INTERVAL_SECS
# - LUMINOSITY_TIMEZONE
# - LUMINOSITY_HOST
# - LUMINOSITY_PORT
# - LUMINOSITY_LOG_LEVEL
# - LUMINOSITY_LOG_FORMAT

[sth]
# STH-Comet server URL
base_url = "http://localhost:8666"

# FIWARE tenant headers
service = "smart"
service_path = "/"

# Entity and attribute to chart
entity_type = "Lamp"
entity_id = "urn:ngsi-ld:Lamp:001"
attribute = "luminosity"

# Number of most recent points requested per tick (lastN)
last_n = 10

# Optional request timeout in seconds (no timeout when unset)
# request_timeout_secs = 30

[poller]
# Seconds between ticks
interval_secs = 10

# IANA timezone used for chart timestamps
timezone = "Europe/Lisbon"

# What to do with samples re-fetched by overlapping windows:
# "append" keeps every fetched sample, "dedupe" drops already-stored timestamps
overlap = "append"

# Optional cap on stored samples; oldest samples are evicted first
# max_points = 10000

[dashboard]
# Dashboard server host
host = "0.0.0.0"

# Dashboard server port
port = 8050

# Page heading
title = "Luminosity Data Viewer"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
