//! Config resolution: file + environment + CLI flag overrides.

use apgate_config::{Config, load_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the effective configuration for this invocation.
///
/// CLI flags take precedence over environment variables and the config
/// file. The merged result is validated once more because flags can
/// reintroduce out-of-range values.
pub fn resolve_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config(global.config.as_deref())?;

    if let Some(dir) = &global.control_dir {
        cfg.control_dir.clone_from(dir);
    }
    if let Some(dir) = &global.bind_dir {
        cfg.bind_dir.clone_from(dir);
    }
    if let Some(ms) = global.timeout_ms {
        cfg.request_timeout_ms = ms;
    }

    cfg.validate()?;
    Ok(cfg)
}
