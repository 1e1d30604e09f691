//! Endpoint discovery command handler.

use tabled::Tabled;

use apgate_core::Gateway;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Endpoint")]
    name: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(gateway: &Gateway, global: &GlobalOpts) -> Result<(), CliError> {
    let names = gateway.list_endpoints().await?;

    let out = output::render_list(
        &global.output,
        &names,
        |name| EndpointRow { name: name.clone() },
        String::clone,
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
