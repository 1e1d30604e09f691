//! CLI error types with miette diagnostics.
//!
//! Wraps the library errors into user-facing diagnostics with actionable
//! help text and maps each of them to a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use apgate_config::ConfigError;
use apgate_core::GatewayError;

/// Exit codes reported to the shell.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Gateway ──────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(apgate::discovery),
        help(
            "Check that hostapd is running with ctrl_interface enabled and\n\
             that --control-dir points at its control socket directory."
        )
    )]
    Gateway(#[from] GatewayError),

    #[error("{failed} of {total} endpoints failed")]
    #[diagnostic(
        code(apgate::endpoints_failed),
        help(
            "Per-endpoint errors are listed in the command output.\n\
             Check that hostapd is up, or raise --timeout-ms for slow links."
        )
    )]
    EndpointsFailed {
        failed: usize,
        total: usize,
        all_timeouts: bool,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(apgate::config),
        help("Inspect the file passed via --config and any APGATE_* environment overrides.")
    )]
    Config(#[from] ConfigError),

    #[error("Invalid metrics listen address '{addr}': {reason}")]
    #[diagnostic(code(apgate::metrics_addr), help("Use HOST:PORT, for example 0.0.0.0:9090."))]
    InvalidMetricsAddr { addr: String, reason: String },

    // ── Exporter ─────────────────────────────────────────────────────
    #[error("Metrics registry error: {0}")]
    #[diagnostic(code(apgate::metrics))]
    Metrics(#[from] prometheus::Error),

    #[error("Metrics HTTP server error: {0}")]
    #[diagnostic(
        code(apgate::http),
        help("Another process may already be listening on the metrics address.")
    )]
    Http(#[from] hyper::Error),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Gateway(_) => exit_code::CONNECTION,
            Self::EndpointsFailed { all_timeouts, .. } => {
                if *all_timeouts {
                    exit_code::TIMEOUT
                } else {
                    exit_code::CONNECTION
                }
            }
            Self::Config(_) | Self::InvalidMetricsAddr { .. } => exit_code::USAGE,
            Self::Metrics(_) | Self::Http(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}
