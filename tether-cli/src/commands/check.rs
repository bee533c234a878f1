//! `tether check`

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tether_core::{PluginHost, PluginInfo};
use tracing::debug;

#[derive(Args)]
pub struct CheckArgs {
    /// Host config file (defaults to ~/.config/tether/tether.toml)
    pub config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let path = super::config_path(args.config);
    let config = super::load_config(&path)?;

    let info = PluginHost::new(config)
        .check()
        .context("plugin check failed")?;
    debug!(plugin = %info.name, api_version = info.api_version, "Plugin exports verified");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", describe(&info));
    }
    Ok(())
}

fn describe(info: &PluginInfo) -> String {
    let mut out = String::new();
    out.push_str(&format!("plugin:      {}\n", info.name));
    out.push_str(&format!("library:     {}\n", info.library_path.display()));
    out.push_str(&format!("api version: {}\n", info.api_version));
    out.push_str(&format!("entrypoint:  {}\n", info.entrypoint));
    if info.copied {
        out.push_str("loaded from a temporary copy\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> PluginInfo {
        PluginInfo {
            name: "hello_plugin".to_string(),
            library_path: PathBuf::from("/tmp/libhello_plugin.so"),
            api_version: 1,
            entrypoint: "tether_main".to_string(),
            copied: false,
        }
    }

    #[test]
    fn test_describe_lists_exports() {
        let text = describe(&info());
        assert!(text.contains("hello_plugin"));
        assert!(text.contains("/tmp/libhello_plugin.so"));
        assert!(text.contains("tether_main"));
        assert!(!text.contains("temporary copy"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(info()).unwrap();
        assert_eq!(json["name"], "hello_plugin");
        assert_eq!(json["api_version"], 1);
        assert_eq!(json["entrypoint"], "tether_main");
    }
}
