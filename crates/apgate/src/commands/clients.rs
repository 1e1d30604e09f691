//! Station listing command handler.

use tabled::Tabled;

use apgate_core::{ErrorKind, Gateway, StationEntry};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StationRow {
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Connected")]
    connected: String,
    #[tabled(rename = "Idle")]
    idle: String,
    #[tabled(rename = "RX/TX pkts")]
    packets: String,
    #[tabled(rename = "RX/TX bytes")]
    bytes: String,
}

impl From<&StationEntry> for StationRow {
    fn from(entry: &StationEntry) -> Self {
        let station = &entry.station;
        Self {
            endpoint: entry.endpoint.clone(),
            mac: station.mac.clone(),
            flags: station.flags.join(" "),
            connected: format!("{}s", station.connected_time),
            idle: format!("{}ms", station.idle_msec),
            packets: format!("{}/{}", station.rx_packets, station.tx_packets),
            bytes: format!("{}/{}", station.rx_bytes, station.tx_bytes),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    gateway: &Gateway,
    names: &[String],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let report = gateway.list_clients(names).await?;

    let out = match global.output {
        // The JSON form carries the stations and the per-endpoint errors
        OutputFormat::Json => output::render_json_pretty(&report),
        _ => output::render_list(
            &global.output,
            &report.stations,
            |entry| StationRow::from(entry),
            |entry| entry.station.mac.clone(),
        ),
    };
    output::print_output(&out, global.quiet);

    if !global.quiet {
        for err in &report.errors {
            eprintln!("warning: {err}");
        }
    }

    // Partial results are fine; fatal only when every swept endpoint failed
    // and nothing came back.
    if !report.errors.is_empty()
        && report.errors.len() == report.targets
        && report.stations.is_empty()
    {
        let all_timeouts = report
            .errors
            .iter()
            .all(|err| err.kind == ErrorKind::DeadlineExceeded);
        return Err(CliError::EndpointsFailed {
            failed: report.errors.len(),
            total: report.targets,
            all_timeouts,
        });
    }
    Ok(())
}
