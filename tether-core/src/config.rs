//! Host configuration
//!
//! ```toml
//! [plugin]
//! path = "target/debug/libhello_plugin.so"
//! copy_artifacts = false
//!
//! [entrypoint]
//! symbol = "tether_main"
//! unload = true
//!
//! [host]
//! poll_interval_ms = 250
//! unload_timeout_ms = 10000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tether_plugin_api::ENTRYPOINT_SYMBOL;

use crate::plugins::HostError;

/// Default interval between unload signal checks
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

fn default_symbol() -> String {
    ENTRYPOINT_SYMBOL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Full host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub plugin: PluginSection,
    #[serde(default)]
    pub entrypoint: EntrypointSection,
    #[serde(default)]
    pub host: HostSection,
    /// File this config was read from; relative paths resolve against it
    #[serde(skip)]
    source: Option<PathBuf>,
}

/// Which module to load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginSection {
    /// Library file, or a directory containing exactly the plugin library
    pub path: PathBuf,
    /// Load a temporary copy so the original can be rebuilt while loaded
    #[serde(default)]
    pub copy_artifacts: bool,
}

/// How to call into the module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrypointSection {
    /// Exported entrypoint symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Wait for the unload signal and eject the module afterwards.
    /// When false the module stays resident for the life of the host.
    #[serde(default = "default_true")]
    pub unload: bool,
}

impl Default for EntrypointSection {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            unload: true,
        }
    }
}

/// Host-side timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up waiting for the unload signal after this long
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unload_timeout_ms: Option<u64>,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            unload_timeout_ms: None,
        }
    }
}

impl HostSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn unload_timeout(&self) -> Option<Duration> {
        self.unload_timeout_ms.map(Duration::from_millis)
    }
}

impl HostConfig {
    /// Build a config for a library path with every other setting defaulted
    pub fn for_library(path: impl Into<PathBuf>) -> Self {
        Self {
            plugin: PluginSection {
                path: path.into(),
                copy_artifacts: false,
            },
            entrypoint: EntrypointSection::default(),
            host: HostSection::default(),
            source: None,
        }
    }

    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content).map_err(|message| HostError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// File this config was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Canonical path of the configured plugin path
    pub fn plugin_path(&self) -> Result<PathBuf, HostError> {
        match &self.source {
            Some(source) => resolve_relative(source, &self.plugin.path),
            None => self
                .plugin
                .path
                .canonicalize()
                .map_err(|_| HostError::LibraryNotFound {
                    path: self.plugin.path.clone(),
                }),
        }
    }
}

/// Resolve `path` against the directory containing `config_path`.
///
/// Absolute paths are only canonicalized. Either way the target must exist.
pub fn resolve_relative(config_path: &Path, path: &Path) -> Result<PathBuf, HostError> {
    let joined = if path.is_relative() {
        let config_path = config_path.canonicalize()?;
        match config_path.parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    } else {
        path.to_path_buf()
    };

    joined
        .canonicalize()
        .map_err(|_| HostError::LibraryNotFound { path: joined })
}
