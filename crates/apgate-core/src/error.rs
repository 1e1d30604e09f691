// ── Gateway error types ──
//
// User-facing errors from apgate-core. Per-endpoint failures are folded
// into a small kind taxonomy -- consumers never see raw I/O errors, but the
// kind and the OS error code survive for diagnostics and JSON output.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use apgate_ctrl::CtrlError;

/// Coarse classification of an endpoint failure.
///
/// Timeouts stay distinct from transport failures so dashboards can tell a
/// wedged daemon from a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Protocol or bookkeeping failure on our side of the socket.
    Internal,
    /// The endpoint did not answer within the request timeout.
    DeadlineExceeded,
    /// Connecting to or exchanging datagrams with the endpoint failed.
    Transport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Internal => "INTERNAL",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Transport => "TRANSPORT",
        };
        f.write_str(name)
    }
}

/// Failure of one endpoint during a fan-out operation.
///
/// Sibling endpoints are unaffected; these are collected, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{endpoint}: {message}")]
pub struct EndpointError {
    /// Endpoint name, as listed in the control directory.
    pub endpoint: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Raw OS error code, when the failure came from a syscall.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_code: Option<i32>,
}

impl EndpointError {
    /// Classify a control-channel error for `endpoint`.
    pub fn from_ctrl(endpoint: impl Into<String>, err: &CtrlError) -> Self {
        let kind = match err {
            CtrlError::Timeout { .. } => ErrorKind::DeadlineExceeded,
            CtrlError::Connect { .. } | CtrlError::Transport { .. } => ErrorKind::Transport,
            CtrlError::BufferExhausted { .. } | CtrlError::Discovery { .. } => ErrorKind::Internal,
        };
        Self {
            endpoint: endpoint.into(),
            kind,
            message: err.to_string(),
            os_code: err.os_code(),
        }
    }

    /// An internal failure with no underlying OS error.
    pub fn internal(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            kind: ErrorKind::Internal,
            message: message.into(),
            os_code: None,
        }
    }
}

/// Failure of a whole gateway operation.
///
/// Fan-out operations only fail as a whole when the target list itself
/// cannot be determined; anything after that is an [`EndpointError`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Endpoint discovery failed: {source}")]
    Discovery {
        #[from]
        source: CtrlError,
    },
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn error_kind_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorKind::DeadlineExceeded).unwrap();
        assert_eq!(json, "\"DEADLINE_EXCEEDED\"");
        assert_eq!(ErrorKind::Transport.to_string(), "TRANSPORT");
        assert_eq!(ErrorKind::Internal.to_string(), "INTERNAL");
    }

    #[test]
    fn timeout_maps_to_deadline_exceeded() {
        let err = CtrlError::Timeout {
            timeout: std::time::Duration::from_millis(250),
        };
        let mapped = EndpointError::from_ctrl("ap0", &err);
        assert_eq!(mapped.kind, ErrorKind::DeadlineExceeded);
        assert_eq!(mapped.os_code, None);
        assert_eq!(mapped.endpoint, "ap0");
    }

    #[test]
    fn connect_failure_keeps_os_code() {
        let err = CtrlError::Connect {
            path: "/run/hostapd/wlan0".into(),
            source: std::io::Error::from_raw_os_error(111),
        };
        let mapped = EndpointError::from_ctrl("wlan0", &err);
        assert_eq!(mapped.kind, ErrorKind::Transport);
        assert_eq!(mapped.os_code, Some(111));
    }

    #[test]
    fn buffer_exhaustion_is_internal() {
        let err = CtrlError::BufferExhausted { limit: 4096 };
        let mapped = EndpointError::from_ctrl("ap0", &err);
        assert_eq!(mapped.kind, ErrorKind::Internal);
        assert_eq!(mapped.os_code, None);
    }
}
