//! Liveness check command handler.
//!
//! One row per endpoint; the process exit code reflects the worst
//! outcome so `apgate ping` works as a health probe in scripts.

use serde::Serialize;
use tabled::Tabled;

use apgate_core::{EndpointError, ErrorKind, Gateway};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Per-endpoint outcome ────────────────────────────────────────────

#[derive(Serialize)]
struct PingOutcome {
    endpoint: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    os_code: Option<i32>,
}

impl PingOutcome {
    fn new(endpoint: String, result: Result<(), EndpointError>) -> Self {
        match result {
            Ok(()) => Self {
                endpoint,
                ok: true,
                kind: None,
                error: None,
                os_code: None,
            },
            Err(err) => Self {
                endpoint,
                ok: false,
                kind: Some(err.kind),
                error: Some(err.message),
                os_code: err.os_code,
            },
        }
    }
}

#[derive(Tabled)]
struct PingRow {
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&PingOutcome> for PingRow {
    fn from(outcome: &PingOutcome) -> Self {
        let (status, detail) = match (outcome.kind, &outcome.error) {
            (Some(kind), Some(message)) => (kind.to_string(), message.clone()),
            _ => ("ok".into(), String::new()),
        };
        Self {
            endpoint: outcome.endpoint.clone(),
            status,
            detail,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    gateway: &Gateway,
    names: &[String],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let results = gateway.ping(names).await?;

    let outcomes: Vec<PingOutcome> = results
        .into_iter()
        .map(|(endpoint, result)| PingOutcome::new(endpoint, result))
        .collect();

    let out = output::render_list(
        &global.output,
        &outcomes,
        |outcome| PingRow::from(outcome),
        |outcome| match outcome.kind {
            Some(kind) => format!("{} {kind}", outcome.endpoint),
            None => format!("{} ok", outcome.endpoint),
        },
    );
    output::print_output(&out, global.quiet);

    let failed = outcomes.iter().filter(|outcome| !outcome.ok).count();
    if failed > 0 {
        let all_timeouts = outcomes
            .iter()
            .filter(|outcome| !outcome.ok)
            .all(|outcome| outcome.kind == Some(ErrorKind::DeadlineExceeded));
        return Err(CliError::EndpointsFailed {
            failed,
            total: outcomes.len(),
            all_timeouts,
        });
    }
    Ok(())
}
