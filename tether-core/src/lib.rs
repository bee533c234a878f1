//! tether-core: host side of the tether plugin handshake
//!
//! Loads a plugin library, calls its entrypoint with the address of the
//! host's unload callback, waits for the plugin to invoke it, and ejects
//! the library.
//!
//! - **Configuration** - [`HostConfig`] read from `tether.toml`
//! - **Plugin host** - [`PluginHost`] for load/check/run
//! - **Unload signal** - [`UnloadSignal`] observed by the host

pub mod config;
pub mod plugins;

pub use config::HostConfig;
pub use plugins::{
    Handshake, HostError, LoadedPlugin, PluginHost, PluginInfo, PluginState, RunReport,
    UnloadSignal, handshake,
};
