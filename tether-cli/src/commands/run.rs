//! `tether run`

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tether_core::{PluginHost, PluginState, RunReport};
use tracing::{debug, info, warn};

#[derive(Args)]
pub struct RunArgs {
    /// Host config file (defaults to ~/.config/tether/tether.toml)
    pub config: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs) -> Result<()> {
    let path = super::config_path(args.config);
    let config = super::load_config(&path)?;

    let host = PluginHost::new(config);
    info!(config = %path.display(), "Running plugin");
    let report = host.run().context("plugin run failed")?;
    debug!(
        plugin = %report.plugin,
        state = ?report.state,
        unload_calls = report.unload_calls,
        elapsed = ?report.elapsed,
        "Run finished"
    );
    if report.unload_calls > 1 {
        warn!(
            plugin = %report.plugin,
            calls = report.unload_calls,
            "Unload handle invoked more than once"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", describe(&report));
    }
    Ok(())
}

fn describe(report: &RunReport) -> String {
    let outcome = match report.state {
        PluginState::Unloaded => "unloaded",
        PluginState::Resident => "left resident",
        _ => "still running",
    };

    let mut line = format!(
        "{} {} after {:.2?}",
        report.plugin, outcome, report.elapsed
    );
    if report.unload_calls > 1 {
        line.push_str(&format!(
            " (unload handle invoked {} times)",
            report.unload_calls
        ));
    }
    line
}
