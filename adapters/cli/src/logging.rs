//! Log subscriber bootstrap.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Crates whose logs `--verbose` raises to debug.
const WORKSPACE_TARGETS: [&str; 4] = [
    "raid_rehearsal",
    "raid_rehearsal_world",
    "raid_rehearsal_system_authoring",
    "raid_rehearsal_rendering_macroquad",
];

/// Installs the global fmt subscriber. `RUST_LOG` wins over `verbose` when set.
pub(crate) fn init(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .map_err(|error| anyhow!("invalid log filter: {error}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn default_directives(verbose: bool) -> String {
    let mut directives = String::from("info");
    if verbose {
        for target in WORKSPACE_TARGETS {
            directives.push(',');
            directives.push_str(target);
            directives.push_str("=debug");
        }
    }
    directives
}
