//! Parsing of station info blocks returned by `STA-FIRST` / `STA-NEXT`.

use serde::Serialize;
use tracing::warn;

use crate::error::ParseError;

/// One associated station as reported by the daemon.
///
/// Counters the daemon did not report stay at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Station {
    /// MAC address, taken from the block's first line.
    pub mac: String,
    /// Flag tokens from the `flags=[A][B]` line, in reported order.
    pub flags: Vec<String>,
    /// Seconds since the station associated.
    pub connected_time: u64,
    /// Milliseconds since the station last sent a frame.
    pub idle_msec: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Parse one station info block.
///
/// The first line is the MAC address and is taken as-is, even when it
/// contains `=`. Every later line is a `key=value` pair: recognized keys
/// fill the matching field, unknown keys are ignored, and lines without
/// `=` are logged and skipped. A counter value that does not parse as an
/// unsigned integer fails the whole block.
pub fn parse_station_block(block: &str) -> Result<Station, ParseError> {
    let mut lines = block.lines();
    let mac = lines.next().ok_or(ParseError::EmptyBlock)?;

    let mut station = Station {
        mac: mac.trim().to_owned(),
        ..Station::default()
    };

    for line in lines {
        let Some((key, value)) = line.split_once('=') else {
            if !line.trim().is_empty() {
                warn!(line, "malformed station info line");
            }
            continue;
        };

        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "flags" => station.flags = parse_flags(value),
            "connected_time" => {
                station.connected_time = parse_counter("connected_time", value)?;
            }
            "idle_msec" => station.idle_msec = parse_counter("idle_msec", value)?,
            "rx_packets" => station.rx_packets = parse_counter("rx_packets", value)?,
            "tx_packets" => station.tx_packets = parse_counter("tx_packets", value)?,
            "rx_bytes" => station.rx_bytes = parse_counter("rx_bytes", value)?,
            "tx_bytes" => station.tx_bytes = parse_counter("tx_bytes", value)?,
            _ => {}
        }
    }

    Ok(station)
}

fn parse_counter(key: &'static str, value: &str) -> Result<u64, ParseError> {
    value.parse().map_err(|_| ParseError::BadCounter {
        key,
        value: value.to_owned(),
    })
}

/// Extract bracketed flag tokens such as `[AUTH][ASSOC][AUTHORIZED]`.
///
/// Order and duplicates are preserved. Empty `[]` pairs are dropped and a
/// trailing unterminated bracket is ignored.
fn parse_flags(value: &str) -> Vec<String> {
    let mut flags = Vec::new();
    let mut rest = value;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open + 1..].find(']') else {
            break;
        };
        let token = &rest[open + 1..open + 1 + close];
        if !token.is_empty() {
            flags.push(token.to_owned());
        }
        rest = &rest[open + 1 + close + 1..];
    }
    flags
}
