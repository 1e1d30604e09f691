//! Prometheus exporter command handler.
//!
//! Wires the scrape loop to an HTTP exposition endpoint and keeps both
//! running until Ctrl-C, then drains in order: stop accepting HTTP
//! requests, join the server, cancel the scraper, join it. The scraper
//! owns the gateway, so joining it also closes the control channels.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use apgate_config::Config;
use apgate_core::{Gateway, StationGauges, scrape_task};

use crate::cli::{GlobalOpts, ServeArgs};
use crate::error::CliError;

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    gateway: Gateway,
    args: ServeArgs,
    config: &Config,
    _global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut cfg = config.clone();
    if let Some(addr) = args.metrics_addr {
        cfg.metrics_addr = addr;
    }
    if let Some(ms) = args.scrape_interval_ms {
        cfg.scrape_interval_ms = ms;
    }
    cfg.validate()?;

    let addr: SocketAddr = cfg
        .metrics_addr
        .parse()
        .map_err(|err: std::net::AddrParseError| CliError::InvalidMetricsAddr {
            addr: cfg.metrics_addr.clone(),
            reason: err.to_string(),
        })?;

    let registry = Registry::new();
    let gauges = Arc::new(StationGauges::register(&registry)?);
    let gateway = Arc::new(gateway);

    let cancel = CancellationToken::new();
    let scraper = tokio::spawn(scrape_task(
        gauges,
        gateway,
        cfg.scrape_interval(),
        cancel.clone(),
    ));

    let make_svc = make_service_fn(move |_conn| {
        let registry = registry.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let registry = registry.clone();
                async move { Ok::<_, Infallible>(handle_request(&registry, &req)) }
            }))
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = Server::try_bind(&addr)?
        .serve(make_svc)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });

    info!(%addr, interval_ms = cfg.scrape_interval_ms, "Metrics exporter listening");
    let server_task = tokio::spawn(server);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, draining");

    let _ = shutdown_tx.send(());
    match server_task.await {
        Ok(result) => result?,
        Err(err) => warn!(error = %err, "Metrics server task failed"),
    }

    cancel.cancel();
    if let Err(err) = scraper.await {
        warn!(error = %err, "Scrape task did not shut down cleanly");
    }

    info!("Exporter stopped");
    Ok(())
}

// ── HTTP plumbing ───────────────────────────────────────────────────

fn handle_request(registry: &Registry, req: &Request<Body>) -> Response<Body> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => metrics_response(registry),
        _ => {
            let mut response = Response::new(Body::from("not found\n"));
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
    }
}

fn metrics_response(registry: &Registry) -> Response<Body> {
    let metric_families = registry.gather();
    let mut buf = Vec::new();
    if let Err(err) = TextEncoder::new().encode(&metric_families, &mut buf) {
        warn!(error = %err, "Metrics encoding failed");
        let mut response = Response::new(Body::from("encoding error\n"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return response;
    }

    let mut response = Response::new(Body::from(buf));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    response
}
