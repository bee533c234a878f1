pub mod check;
pub mod config;
pub mod run;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tether_core::HostConfig;
use tracing::debug;

/// Config file to use: the one given on the command line, else the default
pub fn config_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(tether_paths::default_config_file)
}

/// Load the host config, naming the file in any error
pub fn load_config(path: &Path) -> Result<HostConfig> {
    debug!(path = %path.display(), "Loading host config");
    let config = HostConfig::load(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    debug!(
        plugin = %config.plugin.path.display(),
        symbol = %config.entrypoint.symbol,
        unload = config.entrypoint.unload,
        "Host config loaded"
    );
    Ok(config)
}
