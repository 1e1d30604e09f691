// apgate-core: Gateway layer between apgate-ctrl and consumers (CLI/exporter).

pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::GatewayConfig;
pub use error::{EndpointError, ErrorKind, GatewayError};
pub use gateway::{ClientsReport, Gateway, PingResults, StationEntry};
pub use metrics::{StationGauges, scrape_task};

// Station data comes from the protocol crate; re-export for consumers.
pub use apgate_ctrl::Station;
