use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `apgate-ctrl` crate.
///
/// Covers every failure mode of the transport layer: channel establishment,
/// the request/reply exchange itself, and endpoint discovery.
/// `apgate-core` maps these into per-endpoint operation results.
#[derive(Debug, Error)]
pub enum CtrlError {
    // ── Channel establishment ───────────────────────────────────────
    /// The endpoint socket (or our client-side socket) could not be set up:
    /// endpoint missing, permission denied, bind directory unusable.
    #[error("Cannot connect to control socket {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // ── Request transport ───────────────────────────────────────────
    /// I/O failure on an established channel (send or receive).
    #[error("Control socket transport error: {source}")]
    Transport {
        #[source]
        source: io::Error,
    },

    /// The daemon did not reply within the caller's deadline. A dedicated
    /// signal, never folded into [`CtrlError::Transport`].
    #[error("Control request timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// The reply did not fit the channel's receive buffer.
    #[error("Control reply exceeded the {limit}-byte reply buffer")]
    BufferExhausted { limit: usize },

    // ── Endpoint discovery ──────────────────────────────────────────
    /// The control directory could not be enumerated.
    #[error("Cannot enumerate control endpoints in {}: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CtrlError {
    /// OS error code carried by the underlying I/O failure, if any.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Connect { source, .. }
            | Self::Transport { source }
            | Self::Discovery { source, .. } => source.raw_os_error(),
            Self::Timeout { .. } | Self::BufferExhausted { .. } => None,
        }
    }

    /// Returns `true` for the dedicated deadline-exceeded signal.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Fatal failures while parsing one station info block.
///
/// Recoverable oddities (a line without `key=value` shape) are logged and
/// skipped by the parser instead of surfacing here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The block contained no lines at all, so there is no address.
    #[error("Station info block is empty")]
    EmptyBlock,

    /// A counter field failed to parse as an unsigned integer. Garbage in
    /// one of these fields means the daemon speaks a different protocol
    /// revision than we expect, so the whole record is rejected.
    #[error("Invalid {key} value {value:?}: expected an unsigned integer")]
    BadCounter { key: &'static str, value: String },
}
