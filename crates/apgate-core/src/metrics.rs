// ── Prometheus gauges ──
//
// One gauge series per endpoint ever seen. Endpoints that vanish or stop
// answering are set to zero, never removed from the registry.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use prometheus::{IntGaugeVec, Opts, Registry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::gateway::Gateway;

/// Station gauges for a group of endpoints.
pub struct StationGauges {
    connected_clients: IntGaugeVec,
    /// Every endpoint that ever had a series, so zeroing can reach all of
    /// them even after they disappear from the control directory.
    seen: Mutex<BTreeSet<String>>,
}

impl StationGauges {
    /// Create the gauges and register them with `registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let connected_clients = IntGaugeVec::new(
            Opts::new(
                "hostapd_connected_clients",
                "Number of stations currently associated with the endpoint",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(connected_clients.clone()))?;

        Ok(Self {
            connected_clients,
            seen: Mutex::new(BTreeSet::new()),
        })
    }

    /// Refresh every gauge from the gateway's current view.
    ///
    /// Never fails: discovery trouble zeroes everything, per-endpoint
    /// trouble zeroes that endpoint, and both are logged.
    pub async fn scrape(&self, gateway: &Gateway) {
        let names = match gateway.list_endpoints().await {
            Ok(names) => names,
            Err(err) => {
                warn!(error = %err, "endpoint discovery failed, zeroing all gauges");
                self.zero_all();
                return;
            }
        };

        {
            let mut seen = self.seen.lock().expect("seen set lock poisoned");
            seen.extend(names.iter().cloned());
            for endpoint in &*seen {
                self.connected_clients
                    .with_label_values(&[endpoint.as_str()])
                    .set(0);
            }
        }

        if names.is_empty() {
            debug!("no endpoints in control directory");
            return;
        }

        let report = match gateway.list_clients(&names).await {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "station sweep failed");
                return;
            }
        };

        for err in &report.errors {
            warn!(endpoint = %err.endpoint, error = %err, "endpoint scrape failed");
        }

        let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
        for entry in &report.stations {
            *counts.entry(entry.endpoint.as_str()).or_insert(0) += 1;
        }
        for (endpoint, count) in counts {
            self.connected_clients
                .with_label_values(&[endpoint])
                .set(count);
        }
    }

    fn zero_all(&self) {
        let seen = self.seen.lock().expect("seen set lock poisoned");
        for endpoint in &*seen {
            self.connected_clients
                .with_label_values(&[endpoint.as_str()])
                .set(0);
        }
    }
}

/// Periodically scrape `gateway` into `gauges` until `cancel` fires.
///
/// The first scrape runs immediately, then once per `period`.
pub async fn scrape_task(
    gauges: Arc<StationGauges>,
    gateway: Arc<Gateway>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => gauges.scrape(&gateway).await,
        }
    }
    debug!("scrape task stopped");
}
