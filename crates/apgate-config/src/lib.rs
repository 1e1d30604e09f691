//! Configuration for the apgate binary.
//!
//! Hard defaults, an optional TOML file, and `APGATE_`-prefixed environment
//! variables, merged in that order. The result translates into
//! `apgate_core::GatewayConfig` for the gateway layer; this crate never
//! opens a socket.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use apgate_core::GatewayConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Top-level configuration, one flat table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directory hostapd creates its control sockets in.
    #[serde(default = "default_control_dir")]
    pub control_dir: PathBuf,

    /// Directory apgate binds its own client sockets in.
    #[serde(default = "default_bind_dir")]
    pub bind_dir: PathBuf,

    /// Maximum number of cached control channels.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,

    /// Deadline for a single control request, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Period of the metrics scrape loop, in milliseconds.
    #[serde(default = "default_scrape_interval_ms")]
    pub scrape_interval_ms: u64,

    /// Listen address of the `serve` metrics exporter.
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            control_dir: default_control_dir(),
            bind_dir: default_bind_dir(),
            pool_capacity: default_pool_capacity(),
            request_timeout_ms: default_request_timeout_ms(),
            scrape_interval_ms: default_scrape_interval_ms(),
            metrics_addr: default_metrics_addr(),
        }
    }
}

fn default_control_dir() -> PathBuf {
    PathBuf::from("/var/run/hostapd")
}
fn default_bind_dir() -> PathBuf {
    PathBuf::from("/var/run/apgate")
}
fn default_pool_capacity() -> usize {
    5
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_scrape_interval_ms() -> u64 {
    5_000
}
fn default_metrics_addr() -> String {
    "0.0.0.0:9090".into()
}

impl Config {
    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_capacity == 0 {
            return Err(ConfigError::Validation {
                field: "pool_capacity".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "request_timeout_ms".into(),
                reason: "must be non-zero".into(),
            });
        }
        if self.scrape_interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "scrape_interval_ms".into(),
                reason: "must be non-zero".into(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_millis(self.scrape_interval_ms)
    }

    /// Translate to the gateway layer's runtime config.
    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            control_dir: self.control_dir.clone(),
            bind_dir: self.bind_dir.clone(),
            pool_capacity: self.pool_capacity,
            request_timeout: self.request_timeout(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "apgate", "apgate").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("apgate");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from defaults, a TOML file, and `APGATE_*` environment
/// variables, in that precedence order.
///
/// An explicitly named file must exist; the canonical one is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let figment = Figment::new().merge(Serialized::defaults(Config::default()));
    let figment = match path {
        Some(path) => figment.merge(Toml::file_exact(path)),
        None => figment.merge(Toml::file(config_path())),
    };

    let config: Config = figment.merge(Env::prefixed("APGATE_")).extract()?;
    config.validate()?;
    Ok(config)
}
