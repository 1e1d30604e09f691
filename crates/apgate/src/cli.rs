//! Clap derive structures for the `apgate` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// apgate -- gateway CLI for hostapd control-interface sockets
#[derive(Debug, Parser)]
#[command(
    name = "apgate",
    version,
    about = "Query hostapd access points and export station metrics",
    long_about = "A gateway for hostapd control-interface sockets.\n\n\
        Discovers endpoints under the control directory, fans commands out\n\
        to every access point, and can serve the per-endpoint station counts\n\
        to Prometheus.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to a TOML config file
    #[arg(long, short = 'c', env = "APGATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding hostapd control sockets
    #[arg(long, env = "APGATE_CONTROL_DIR", global = true)]
    pub control_dir: Option<PathBuf>,

    /// Directory for this process's reply sockets
    #[arg(long, env = "APGATE_BIND_DIR", global = true)]
    pub bind_dir: Option<PathBuf>,

    /// Reply deadline per request, in milliseconds
    #[arg(long, env = "APGATE_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "APGATE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Format ────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List endpoints exposing a control socket
    #[command(alias = "ls")]
    Endpoints,

    /// Check endpoint liveness with a control-interface PING
    Ping {
        /// Endpoint names (default: every discovered endpoint)
        #[arg(value_name = "ENDPOINT")]
        names: Vec<String>,
    },

    /// List stations associated with each endpoint
    #[command(alias = "cl", alias = "stations")]
    Clients {
        /// Endpoint names (default: every discovered endpoint)
        #[arg(value_name = "ENDPOINT")]
        names: Vec<String>,
    },

    /// Run the Prometheus exporter
    Serve(ServeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── SERVE ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address for the metrics endpoint (HOST:PORT)
    #[arg(long, env = "APGATE_METRICS_ADDR")]
    pub metrics_addr: Option<String>,

    /// Milliseconds between scrape cycles
    #[arg(long, env = "APGATE_SCRAPE_INTERVAL_MS")]
    pub scrape_interval_ms: Option<u64>,
}

// ── COMPLETIONS ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
