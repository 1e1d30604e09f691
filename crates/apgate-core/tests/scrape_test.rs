// Integration tests for `StationGauges`: zero-never-remove semantics.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, Registry};
use tokio::net::UnixDatagram;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use apgate_core::{Gateway, GatewayConfig, StationGauges, scrape_task};

// ── Helpers ─────────────────────────────────────────────────────────

struct TestDirs {
    root: tempfile::TempDir,
    ctrl: PathBuf,
    bind: PathBuf,
}

fn test_dirs() -> TestDirs {
    let root = tempfile::tempdir().unwrap();
    let ctrl = root.path().join("ctrl");
    let bind = root.path().join("bind");
    std::fs::create_dir(&ctrl).unwrap();
    std::fs::create_dir(&bind).unwrap();
    TestDirs { root, ctrl, bind }
}

fn gateway(dirs: &TestDirs) -> Gateway {
    Gateway::new(&GatewayConfig {
        control_dir: dirs.ctrl.clone(),
        bind_dir: dirs.bind.clone(),
        pool_capacity: 5,
        request_timeout: Duration::from_secs(1),
    })
}

fn station_block(mac: &str) -> String {
    format!("{mac}\nflags=[AUTH][ASSOC]\nconnected_time=5\nrx_packets=1\ntx_packets=1\n")
}

/// Fake hostapd endpoint speaking `PING` and the station cursor.
fn spawn_hostapd(path: &Path, blocks: Vec<String>) -> JoinHandle<()> {
    let macs: Vec<String> = blocks
        .iter()
        .filter_map(|block| block.lines().next().map(str::to_owned))
        .collect();

    let socket = UnixDatagram::bind(path).unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        while let Ok((n, peer)) = socket.recv_from(&mut buf).await {
            let command = String::from_utf8_lossy(&buf[..n]).into_owned();
            let Some(peer_path) = peer.as_pathname().map(Path::to_path_buf) else {
                continue;
            };
            let reply = match command.as_str() {
                "PING" => b"PONG\n".to_vec(),
                "STA-FIRST" => blocks.first().map_or_else(Vec::new, |b| b.as_bytes().to_vec()),
                other => match other.strip_prefix("STA-NEXT ") {
                    Some(mac) => match macs.iter().position(|m| m == mac) {
                        Some(i) => blocks.get(i + 1).map_or_else(Vec::new, |b| b.as_bytes().to_vec()),
                        None => b"FAIL\n".to_vec(),
                    },
                    None => b"FAIL\n".to_vec(),
                },
            };
            socket.send_to(&reply, &peer_path).await.unwrap();
        }
    })
}

fn encoded(registry: &Registry) -> String {
    let mut buf = Vec::new();
    prometheus::TextEncoder::new()
        .encode(&registry.gather(), &mut buf)
        .unwrap();
    String::from_utf8(buf).unwrap()
}

fn gauge_value(registry: &Registry, endpoint: &str) -> Option<i64> {
    let needle = format!("hostapd_connected_clients{{endpoint=\"{endpoint}\"}} ");
    encoded(registry)
        .lines()
        .find_map(|line| line.strip_prefix(needle.as_str())?.trim().parse().ok())
}

// ── Scrapes ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_scrape_sets_station_counts_per_endpoint() {
    let dirs = test_dirs();
    let _ap0 = spawn_hostapd(
        &dirs.ctrl.join("ap0"),
        vec![
            station_block("02:00:00:00:00:01"),
            station_block("02:00:00:00:00:02"),
        ],
    );
    let _ap1 = spawn_hostapd(&dirs.ctrl.join("ap1"), vec![station_block("02:00:00:00:00:03")]);

    let registry = Registry::new();
    let gauges = StationGauges::register(&registry).unwrap();
    let gateway = gateway(&dirs);

    gauges.scrape(&gateway).await;

    assert_eq!(gauge_value(&registry, "ap0"), Some(2));
    assert_eq!(gauge_value(&registry, "ap1"), Some(1));
    assert!(encoded(&registry).contains("# TYPE hostapd_connected_clients gauge"));
}

#[tokio::test]
async fn test_scrape_zeroes_vanished_endpoint_and_recovers() {
    let dirs = test_dirs();
    let _ap0 = spawn_hostapd(&dirs.ctrl.join("ap0"), vec![station_block("02:00:00:00:00:01")]);

    let registry = Registry::new();
    let gauges = StationGauges::register(&registry).unwrap();
    let gateway = gateway(&dirs);

    gauges.scrape(&gateway).await;
    assert_eq!(gauge_value(&registry, "ap0"), Some(1));

    // Vanish: the socket file leaves the control directory; the series must
    // drop to zero but stay exported.
    let parked = dirs.root.path().join("ap0-parked");
    std::fs::rename(dirs.ctrl.join("ap0"), &parked).unwrap();
    gauges.scrape(&gateway).await;
    assert_eq!(gauge_value(&registry, "ap0"), Some(0));

    std::fs::rename(&parked, dirs.ctrl.join("ap0")).unwrap();
    gauges.scrape(&gateway).await;
    assert_eq!(gauge_value(&registry, "ap0"), Some(1));
}

#[tokio::test]
async fn test_scrape_zeroes_all_on_discovery_failure() {
    let dirs = test_dirs();
    let _ap0 = spawn_hostapd(&dirs.ctrl.join("ap0"), vec![station_block("02:00:00:00:00:01")]);

    let registry = Registry::new();
    let gauges = StationGauges::register(&registry).unwrap();
    let gateway = gateway(&dirs);

    gauges.scrape(&gateway).await;
    assert_eq!(gauge_value(&registry, "ap0"), Some(1));

    std::fs::remove_dir_all(&dirs.ctrl).unwrap();
    gauges.scrape(&gateway).await;
    assert_eq!(gauge_value(&registry, "ap0"), Some(0));
}

#[tokio::test]
async fn test_scrape_zeroes_unreachable_endpoint_without_dropping_series() {
    let dirs = test_dirs();
    let _ap0 = spawn_hostapd(&dirs.ctrl.join("ap0"), vec![station_block("02:00:00:00:00:01")]);
    // Dead endpoint: the socket file exists but nothing listens behind it.
    drop(UnixDatagram::bind(dirs.ctrl.join("ap1")).unwrap());

    let registry = Registry::new();
    let gauges = StationGauges::register(&registry).unwrap();
    let gateway = gateway(&dirs);

    gauges.scrape(&gateway).await;

    assert_eq!(gauge_value(&registry, "ap0"), Some(1));
    assert_eq!(gauge_value(&registry, "ap1"), Some(0));
}

#[tokio::test]
async fn test_scrape_on_empty_control_dir_creates_no_series() {
    let dirs = test_dirs();
    let registry = Registry::new();
    let gauges = StationGauges::register(&registry).unwrap();
    let gateway = gateway(&dirs);

    gauges.scrape(&gateway).await;

    assert!(!encoded(&registry).contains("endpoint=\""));
}

// ── Background task ─────────────────────────────────────────────────

#[tokio::test]
async fn test_scrape_task_scrapes_immediately_and_stops_on_cancel() {
    let dirs = test_dirs();
    let _ap0 = spawn_hostapd(&dirs.ctrl.join("ap0"), vec![station_block("02:00:00:00:00:01")]);

    let registry = Registry::new();
    let gauges = Arc::new(StationGauges::register(&registry).unwrap());
    let gateway = Arc::new(gateway(&dirs));
    let cancel = CancellationToken::new();

    let task = tokio::spawn(scrape_task(
        Arc::clone(&gauges),
        gateway,
        Duration::from_secs(60),
        cancel.clone(),
    ));

    // The period is long on purpose; only the immediate first scrape can
    // have populated the gauge.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(gauge_value(&registry, "ap0"), Some(1));

    cancel.cancel();
    task.await.unwrap();
}
