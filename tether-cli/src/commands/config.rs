use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use tether_core::HostConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show a config file with defaults applied
    Show {
        /// Config file (defaults to ~/.config/tether/tether.toml)
        config: Option<PathBuf>,
    },
    /// Show the default configuration file path
    Path,
    /// Write a starter config for a plugin library
    Init {
        /// Plugin library to load
        library: PathBuf,
        /// Where to write the config (defaults to ~/.config/tether/tether.toml)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show { config } => show_config(super::config_path(config)),
        ConfigCommands::Path => show_path(),
        ConfigCommands::Init {
            library,
            output,
            force,
        } => init_config(library, super::config_path(output), force),
    }
}

fn show_config(path: PathBuf) -> Result<()> {
    let config = super::load_config(&path)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn show_path() -> Result<()> {
    println!("{}", tether_paths::default_config_file().display());
    Ok(())
}

fn init_config(library: PathBuf, output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let library = library
        .canonicalize()
        .with_context(|| format!("plugin library {} not found", library.display()))?;
    let config = HostConfig::for_library(library);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, toml::to_string_pretty(&config)?)?;

    println!("Wrote {}", output.display());
    Ok(())
}
