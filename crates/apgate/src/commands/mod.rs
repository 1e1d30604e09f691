//! Command dispatch: bridges CLI args -> gateway operations -> output.

pub mod clients;
pub mod endpoints;
pub mod ping;
pub mod serve;

use apgate_config::Config;
use apgate_core::Gateway;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    gateway: Gateway,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Endpoints => endpoints::handle(&gateway, global).await,
        Command::Ping { names } => ping::handle(&gateway, &names, global).await,
        Command::Clients { names } => clients::handle(&gateway, &names, global).await,
        Command::Serve(args) => serve::handle(gateway, args, config, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}
