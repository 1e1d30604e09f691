// Integration tests for `ChannelPool`: lazy opening, eviction, discovery.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UnixDatagram;
use tokio::task::JoinHandle;

use apgate_ctrl::{ChannelPool, CtrlError};

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

fn pool(dirs: &TestDirs, capacity: usize) -> ChannelPool {
    ChannelPool::new(dirs.ctrl.clone(), dirs.bind.clone(), capacity)
}

/// Bind an endpoint socket so connects succeed; the socket itself never
/// answers. Keep the return value alive for as long as the endpoint should
/// accept connections.
fn bind_endpoint(path: &Path) -> UnixDatagram {
    UnixDatagram::bind(path).unwrap()
}

/// Endpoint that answers every request with `PONG\n` after `delay`.
fn spawn_delayed_pong(path: &Path, delay: Duration) -> JoinHandle<()> {
    let socket = UnixDatagram::bind(path).unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        while let Ok((_, peer)) = socket.recv_from(&mut buf).await {
            let Some(peer_path) = peer.as_pathname().map(Path::to_path_buf) else {
                continue;
            };
            tokio::time::sleep(delay).await;
            socket.send_to(b"PONG\n", &peer_path).await.unwrap();
        }
    })
}

// ── Caching and eviction ────────────────────────────────────────────

#[tokio::test]
async fn test_get_opens_lazily_and_reuses() {
    let dirs = test_dirs();
    let pool = pool(&dirs, 5);
    let _ep = bind_endpoint(&dirs.ctrl.join("hostapd0"));

    assert!(pool.is_empty().await);

    let first = pool.get("hostapd0").await.unwrap();
    assert_eq!(pool.len().await, 1);

    let second = pool.get("hostapd0").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.len().await, 1);
}

#[tokio::test]
async fn test_full_pool_stays_within_capacity() {
    let dirs = test_dirs();
    let pool = pool(&dirs, 2);
    let _a = bind_endpoint(&dirs.ctrl.join("a"));
    let _b = bind_endpoint(&dirs.ctrl.join("b"));
    let _c = bind_endpoint(&dirs.ctrl.join("c"));

    pool.get("a").await.unwrap();
    pool.get("b").await.unwrap();
    assert_eq!(pool.len().await, 2);

    let c = pool.get("c").await.unwrap();
    assert_eq!(pool.len().await, 2);

    // The newest channel is cached; fetching it again is a hit.
    let c_again = pool.get("c").await.unwrap();
    assert!(Arc::ptr_eq(&c, &c_again));
}

#[tokio::test]
async fn test_failed_open_evicts_nothing() {
    let dirs = test_dirs();
    let pool = pool(&dirs, 1);
    let _a = bind_endpoint(&dirs.ctrl.join("a"));

    let a = pool.get("a").await.unwrap();

    let err = pool.get("missing").await.unwrap_err();
    assert!(matches!(err, CtrlError::Connect { .. }), "got: {err:?}");

    assert_eq!(pool.len().await, 1);
    let a_again = pool.get("a").await.unwrap();
    assert!(Arc::ptr_eq(&a, &a_again));
}

#[tokio::test]
async fn test_zero_capacity_is_clamped_to_one() {
    let dirs = test_dirs();
    let pool = pool(&dirs, 0);
    let _a = bind_endpoint(&dirs.ctrl.join("a"));
    let _b = bind_endpoint(&dirs.ctrl.join("b"));

    pool.get("a").await.unwrap();
    assert_eq!(pool.len().await, 1);

    pool.get("b").await.unwrap();
    assert_eq!(pool.len().await, 1);
}

#[tokio::test]
async fn test_eviction_does_not_cancel_in_flight_request() {
    let dirs = test_dirs();
    let pool = pool(&dirs, 1);
    let _slow = spawn_delayed_pong(&dirs.ctrl.join("slow"), Duration::from_millis(200));
    let _other = bind_endpoint(&dirs.ctrl.join("other"));

    let slow = pool.get("slow").await.unwrap();
    let request = tokio::spawn({
        let slow = Arc::clone(&slow);
        async move { slow.send("PING", Duration::from_secs(5)).await }
    });

    // Let the request hit the wire, then force the eviction.
    tokio::time::sleep(Duration::from_millis(50)).await;
    pool.get("other").await.unwrap();
    assert_eq!(pool.len().await, 1);

    let reply = request.await.unwrap().unwrap();
    assert_eq!(reply, "PONG\n");
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_available_lists_sorted_socket_names_only() {
    let dirs = test_dirs();
    let pool = pool(&dirs, 5);
    let _c = bind_endpoint(&dirs.ctrl.join("c"));
    let _a = bind_endpoint(&dirs.ctrl.join("a"));
    let _b = bind_endpoint(&dirs.ctrl.join("b"));
    std::fs::write(dirs.ctrl.join("notes.txt"), "not a socket").unwrap();
    std::fs::create_dir(dirs.ctrl.join("subdir")).unwrap();

    let names = pool.available().await.unwrap();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_available_tracks_vanished_and_reappeared_endpoints() {
    let dirs = test_dirs();
    let pool = pool(&dirs, 5);
    let _a = bind_endpoint(&dirs.ctrl.join("a"));

    assert_eq!(pool.available().await.unwrap(), vec!["a"]);

    let parked = dirs.root.path().join("a-parked");
    std::fs::rename(dirs.ctrl.join("a"), &parked).unwrap();
    assert!(pool.available().await.unwrap().is_empty());

    std::fs::rename(&parked, dirs.ctrl.join("a")).unwrap();
    assert_eq!(pool.available().await.unwrap(), vec!["a"]);
}

#[tokio::test]
async fn test_available_fails_for_missing_control_dir() {
    let dirs = test_dirs();
    let pool = ChannelPool::new(dirs.ctrl.join("gone"), dirs.bind.clone(), 5);

    let err = pool.available().await.unwrap_err();
    assert!(matches!(err, CtrlError::Discovery { .. }), "got: {err:?}");
    assert!(err.os_code().is_some());
}
