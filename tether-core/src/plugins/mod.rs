//! Plugin hosting for tether
//!
//! - [`PluginHost`]: loads the configured library and drives the handshake
//! - [`UnloadSignal`]: the host end of the unload handle
//! - [`HostError`]: error types for plugin operations
//!
//! # Handshake
//!
//! ```text
//! host ── tether_main(unload_addr) ──▶ plugin
//!                                       │ work
//! host ◀──────── unload() ─────────────┘
//! host: eject library
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tether_core::{HostConfig, PluginHost};
//!
//! let config = HostConfig::load(Path::new("tether.toml"))?;
//! let report = PluginHost::new(config).run()?;
//! println!("{} ended {:?}", report.plugin, report.state);
//! ```

mod error;
mod host;
mod signal;

pub use error::HostError;
pub use host::{
    Handshake, LoadedPlugin, PluginHost, PluginInfo, PluginState, RunReport, handshake,
};
pub use signal::UnloadSignal;
