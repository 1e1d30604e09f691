// ── Runtime gateway configuration ──
//
// Describes *where* the hostapd endpoints live and how patient requests
// should be. Never touches disk; the CLI builds a `GatewayConfig` from its
// own config sources and hands it in.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for talking to a group of hostapd endpoints.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Directory the daemon creates one control socket per interface in.
    pub control_dir: PathBuf,
    /// Directory our client sockets are bound in. Must be writable.
    pub bind_dir: PathBuf,
    /// Maximum number of cached control channels. Zero is treated as one.
    pub pool_capacity: usize,
    /// Deadline for a single control request, event skipping included.
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            control_dir: PathBuf::from("/var/run/hostapd"),
            bind_dir: PathBuf::from("/var/run/apgate"),
            pool_capacity: 5,
            request_timeout: Duration::from_secs(10),
        }
    }
}
