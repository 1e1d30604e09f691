//! Single control-channel transport: one Unix datagram socket per endpoint.
//!
//! hostapd's control interface is a request/reply protocol over `SOCK_DGRAM`:
//! the client binds its own socket file, connects it to the daemon's socket,
//! then exchanges one command for one reply. The daemon may also push
//! unsolicited event frames (prefixed with `<`) on the same socket; those are
//! skipped while a solicited reply is pending.

use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::UnixDatagram;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::CtrlError;

/// Usable reply capacity in bytes.
///
/// Matches the 4 KiB buffer the stock wpa_ctrl client uses, which hostapd
/// sizes its replies to fit. The receive buffer carries one extra sentinel
/// byte so an over-long datagram surfaces as [`CtrlError::BufferExhausted`]
/// instead of being silently truncated.
pub const REPLY_BUFFER_SIZE: usize = 4096;

/// Process-wide sequence so concurrently opened channels never collide on
/// their client socket paths.
static CHANNEL_SEQ: AtomicU64 = AtomicU64::new(0);

/// One live connection to a control endpoint.
///
/// The socket sits behind its own mutex: at most one request is in flight
/// per channel, and concurrent callers are serialized, never interleaved.
/// Dropping the channel removes its client socket file.
#[derive(Debug)]
pub struct ControlChannel {
    socket: Mutex<UnixDatagram>,
    /// Our bound client socket, unlinked on drop.
    local_path: PathBuf,
    /// The daemon's socket, kept for diagnostics.
    endpoint_path: PathBuf,
}

impl ControlChannel {
    /// Open a channel to the control socket at `endpoint_path`, binding the
    /// client side under `bind_dir`.
    pub async fn open(endpoint_path: PathBuf, bind_dir: &Path) -> Result<Self, CtrlError> {
        let local_path = bind_dir.join(format!(
            "apgate-{}-{}",
            process::id(),
            CHANNEL_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let socket = bind_client_socket(&local_path)?;
        if let Err(source) = socket.connect(&endpoint_path) {
            let _ = std::fs::remove_file(&local_path);
            return Err(CtrlError::Connect { path: endpoint_path, source });
        }

        debug!(
            endpoint = %endpoint_path.display(),
            local = %local_path.display(),
            "control channel open"
        );

        Ok(Self {
            socket: Mutex::new(socket),
            local_path,
            endpoint_path,
        })
    }

    /// Path of the endpoint socket this channel talks to.
    pub fn endpoint_path(&self) -> &Path {
        &self.endpoint_path
    }

    /// Send one command and await its reply, within `timeout`.
    ///
    /// The channel lock is held for the whole exchange, so two concurrent
    /// `send` calls can never cross replies. Event frames pushed by the
    /// daemon while we wait are skipped; the deadline covers the entire
    /// exchange, the outbound send and skipped frames included, and the lock
    /// is released on every exit path.
    pub async fn send(&self, command: &str, timeout: Duration) -> Result<String, CtrlError> {
        let deadline = Instant::now() + timeout;
        let socket = self.socket.lock().await;

        trace!(endpoint = %self.endpoint_path.display(), command, "control request");
        // The send half can block too: a daemon that stopped draining its
        // receive queue makes the kernel push back on the sender.
        tokio::time::timeout_at(deadline, socket.send(command.as_bytes()))
            .await
            .map_err(|_| CtrlError::Timeout { timeout })?
            .map_err(|source| CtrlError::Transport { source })?;

        let mut buf = [0u8; REPLY_BUFFER_SIZE + 1];
        loop {
            let n = tokio::time::timeout_at(deadline, socket.recv(&mut buf))
                .await
                .map_err(|_| CtrlError::Timeout { timeout })?
                .map_err(|source| CtrlError::Transport { source })?;

            if n > REPLY_BUFFER_SIZE {
                return Err(CtrlError::BufferExhausted {
                    limit: REPLY_BUFFER_SIZE,
                });
            }

            // Unsolicited event frame, not the reply we are waiting for.
            if n > 0 && buf.first() == Some(&b'<') {
                debug!(
                    endpoint = %self.endpoint_path.display(),
                    "skipping unsolicited event frame"
                );
                continue;
            }

            let reply = String::from_utf8_lossy(&buf[..n]).into_owned();
            trace!(endpoint = %self.endpoint_path.display(), bytes = n, "control reply");
            return Ok(reply);
        }
    }
}

impl Drop for ControlChannel {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.local_path) {
            debug!(
                path = %self.local_path.display(),
                error = %err,
                "could not remove client socket file"
            );
        }
    }
}

/// Bind the client-side datagram socket, retrying once over a stale file.
///
/// A crashed process with a recycled pid can leave its socket file behind;
/// wpa_ctrl unlinks and rebinds in that case, and so do we.
fn bind_client_socket(local_path: &Path) -> Result<UnixDatagram, CtrlError> {
    let connect_err = |source: io::Error| CtrlError::Connect {
        path: local_path.to_path_buf(),
        source,
    };

    match UnixDatagram::bind(local_path) {
        Ok(socket) => Ok(socket),
        Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
            std::fs::remove_file(local_path).map_err(connect_err)?;
            UnixDatagram::bind(local_path).map_err(connect_err)
        }
        Err(source) => Err(connect_err(source)),
    }
}
