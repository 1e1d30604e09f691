// ── Gateway abstraction ──
//
// Fans a single operation out across many hostapd endpoints. One endpoint
// failing never aborts its siblings; per-endpoint outcomes are collected and
// returned next to whatever data the healthy endpoints produced.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;

use apgate_ctrl::{ChannelPool, ControlChannel, Station, parse_station_block};

use crate::config::GatewayConfig;
use crate::error::{EndpointError, GatewayError};

const PING_COMMAND: &str = "PING";
const PONG_REPLY: &str = "PONG\n";
const STA_FIRST_COMMAND: &str = "STA-FIRST";
const STA_NEXT_COMMAND: &str = "STA-NEXT";
const FAIL_REPLY: &str = "FAIL\n";

/// Liveness outcome per endpoint, keyed by endpoint name.
pub type PingResults = BTreeMap<String, Result<(), EndpointError>>;

/// One station, tagged with the endpoint that reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationEntry {
    pub endpoint: String,
    #[serde(flatten)]
    pub station: Station,
}

/// Aggregated station listing across endpoints.
///
/// `stations` holds every record the reachable endpoints produced, including
/// partial sweeps; `errors` holds one entry per endpoint that failed.
/// `targets` is how many endpoints the sweep covered, so callers can tell a
/// partial failure from a total one.
#[derive(Debug, Clone, Serialize)]
pub struct ClientsReport {
    pub targets: usize,
    pub stations: Vec<StationEntry>,
    pub errors: Vec<EndpointError>,
}

/// The main entry point for consumers.
///
/// Owns the channel pool and applies one request timeout to every control
/// exchange. Operations take an explicit endpoint list; an empty list means
/// "whatever the control directory currently offers".
#[derive(Debug)]
pub struct Gateway {
    pool: ChannelPool,
    request_timeout: Duration,
}

impl Gateway {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            pool: ChannelPool::new(
                config.control_dir.clone(),
                config.bind_dir.clone(),
                config.pool_capacity,
            ),
            request_timeout: config.request_timeout,
        }
    }

    /// Endpoint names currently present in the control directory, sorted.
    pub async fn list_endpoints(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.pool.available().await?)
    }

    /// Check liveness of the given endpoints (all discovered ones if empty).
    ///
    /// Every target gets its own verdict; a dead endpoint shows up as an
    /// [`EndpointError`] in the map, never as an operation failure. The
    /// operation itself only fails when an empty target list forces a
    /// discovery pass and that pass fails.
    pub async fn ping(&self, names: &[String]) -> Result<PingResults, GatewayError> {
        let targets = self.select_endpoints(names).await?;
        let checks = targets.into_iter().map(|name| async move {
            let outcome = self.ping_endpoint(&name).await;
            (name, outcome)
        });

        let results: PingResults = join_all(checks).await.into_iter().collect();
        Ok(results)
    }

    /// List associated stations on the given endpoints (all discovered ones
    /// if empty).
    ///
    /// Endpoints are swept concurrently. An endpoint that fails mid-sweep
    /// keeps the records it produced up to that point and contributes one
    /// error entry on top.
    pub async fn list_clients(&self, names: &[String]) -> Result<ClientsReport, GatewayError> {
        let targets = self.select_endpoints(names).await?;
        let sweeps = targets
            .iter()
            .map(|name| async move { self.list_endpoint_clients(name).await });

        let mut report = ClientsReport {
            targets: targets.len(),
            stations: Vec::new(),
            errors: Vec::new(),
        };
        for (stations, error) in join_all(sweeps).await {
            report.stations.extend(stations);
            if let Some(err) = error {
                report.errors.push(err);
            }
        }
        Ok(report)
    }

    // ── Per-endpoint operations ──────────────────────────────────────

    async fn select_endpoints(&self, names: &[String]) -> Result<Vec<String>, GatewayError> {
        if names.is_empty() {
            self.list_endpoints().await
        } else {
            Ok(names.to_vec())
        }
    }

    async fn ping_endpoint(&self, name: &str) -> Result<(), EndpointError> {
        let channel = self.channel(name).await?;
        let reply = channel
            .send(PING_COMMAND, self.request_timeout)
            .await
            .map_err(|err| EndpointError::from_ctrl(name, &err))?;

        if reply == PONG_REPLY {
            Ok(())
        } else {
            Err(EndpointError::internal(
                name,
                format!("unexpected ping reply {reply:?}"),
            ))
        }
    }

    /// Walk the station list with the `STA-FIRST` / `STA-NEXT` cursor.
    ///
    /// An empty or `FAIL` reply ends the walk. A reply that does not parse
    /// also ends it: the next cursor command needs a MAC we can trust.
    async fn list_endpoint_clients(&self, name: &str) -> (Vec<StationEntry>, Option<EndpointError>) {
        let mut stations = Vec::new();

        let channel = match self.channel(name).await {
            Ok(channel) => channel,
            Err(err) => return (stations, Some(err)),
        };

        let mut command = STA_FIRST_COMMAND.to_owned();
        loop {
            let reply = match channel.send(&command, self.request_timeout).await {
                Ok(reply) => reply,
                Err(err) => return (stations, Some(EndpointError::from_ctrl(name, &err))),
            };

            if reply.is_empty() || reply == FAIL_REPLY {
                return (stations, None);
            }

            let station = match parse_station_block(&reply) {
                Ok(station) => station,
                Err(err) => {
                    return (stations, Some(EndpointError::internal(name, err.to_string())));
                }
            };

            command = format!("{STA_NEXT_COMMAND} {}", station.mac);
            stations.push(StationEntry {
                endpoint: name.to_owned(),
                station,
            });
        }
    }

    async fn channel(&self, name: &str) -> Result<Arc<ControlChannel>, EndpointError> {
        self.pool
            .get(name)
            .await
            .map_err(|err| EndpointError::from_ctrl(name, &err))
    }
}
