//! Bounded pool of control channels, keyed by endpoint name.

use std::collections::HashMap;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::channel::ControlChannel;
use crate::error::CtrlError;

/// Lazily populated channel cache with a hard capacity.
///
/// Channels are opened on first use and reused afterwards. When the pool is
/// full, an arbitrary cached channel is dropped to make room; callers holding
/// an [`Arc`] to the evicted channel keep using it undisturbed, the pool just
/// stops handing it out.
#[derive(Debug)]
pub struct ChannelPool {
    /// Directory the daemon creates its endpoint sockets in.
    control_dir: PathBuf,
    /// Directory our client sockets are bound in.
    bind_dir: PathBuf,
    capacity: usize,
    channels: Mutex<HashMap<String, Arc<ControlChannel>>>,
}

impl ChannelPool {
    /// Create an empty pool. A `capacity` of zero is treated as one.
    pub fn new(control_dir: PathBuf, bind_dir: PathBuf, capacity: usize) -> Self {
        Self {
            control_dir,
            bind_dir,
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the channel for `name`, opening it if absent.
    ///
    /// The pool lock is held across the open, so two callers racing on the
    /// same cold endpoint produce one channel, not two.
    pub async fn get(&self, name: &str) -> Result<Arc<ControlChannel>, CtrlError> {
        let mut channels = self.channels.lock().await;

        if let Some(channel) = channels.get(name) {
            return Ok(Arc::clone(channel));
        }

        let endpoint_path = self.control_dir.join(name);
        let channel = Arc::new(ControlChannel::open(endpoint_path, &self.bind_dir).await?);

        // Evict only after a successful open; a failed open leaves the
        // cache untouched.
        if channels.len() >= self.capacity {
            if let Some(victim) = channels.keys().next().cloned() {
                channels.remove(&victim);
                debug!(endpoint = victim, "evicted channel from full pool");
            }
        }

        channels.insert(name.to_owned(), Arc::clone(&channel));
        Ok(channel)
    }

    /// List endpoint names currently present in the control directory.
    ///
    /// Reads the directory fresh on every call and keeps only socket files,
    /// so endpoints that vanished are gone from the result and new ones show
    /// up without any pool state changing. Names come back sorted.
    pub async fn available(&self) -> Result<Vec<String>, CtrlError> {
        let discovery_err = |source: io::Error| CtrlError::Discovery {
            path: self.control_dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.control_dir)
            .await
            .map_err(discovery_err)?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(discovery_err)? {
            let file_type = entry.file_type().await.map_err(discovery_err)?;
            if file_type.is_socket() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    /// Number of cached channels.
    pub async fn len(&self) -> usize {
        self.channels.lock().await.len()
    }

    /// Whether the pool has no cached channels.
    pub async fn is_empty(&self) -> bool {
        self.channels.lock().await.is_empty()
    }
}
