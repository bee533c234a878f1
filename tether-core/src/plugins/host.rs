//! PluginHost - loads a plugin, runs the entrypoint handshake, ejects it

use libloading::Library;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempPath;

use tether_plugin_api::{API_VERSION, API_VERSION_SYMBOL, ApiVersionFn, EntrypointFn};

use super::error::HostError;
use super::signal::UnloadSignal;
use crate::config::HostConfig;

/// Lifecycle of a loaded plugin, traversed once per load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Library is mapped and its exports resolved
    Loaded,
    /// The entrypoint has been called and has not signaled unload yet
    Working,
    /// The plugin signaled unload; the host is tearing it down
    Unloading,
    /// The library has been released
    Unloaded,
    /// The library stays mapped for the rest of the host's life
    Resident,
}

/// A loaded plugin library with its resolved entrypoint
pub struct LoadedPlugin {
    name: String,
    library_path: PathBuf,
    api_version: u32,
    entry: EntrypointFn,
    state: PluginState,
    /// Keep the library loaded. Dropped before `artifact`.
    library: Option<Library>,
    /// Temporary copy the library was loaded from, if any
    artifact: Option<TempPath>,
}

impl LoadedPlugin {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub fn info(&self, symbol: &str) -> PluginInfo {
        PluginInfo {
            name: self.name.clone(),
            library_path: self.library_path.clone(),
            api_version: self.api_version,
            entrypoint: symbol.to_string(),
            copied: self.artifact.is_some(),
        }
    }

    /// Keep the library mapped for the rest of the process.
    ///
    /// Used when the plugin may still be running code: unmapping it then
    /// would pull the code out from under it.
    fn leak(mut self) -> PluginState {
        if let Some(library) = self.library.take() {
            std::mem::forget(library);
        }
        if let Some(artifact) = self.artifact.take() {
            // Some platforms refuse to delete a mapped file; keep it.
            std::mem::forget(artifact);
        }
        self.state = PluginState::Resident;
        tracing::info!(plugin = %self.name, "Plugin left resident");
        self.state
    }

    /// Release the library and delete any temporary copy.
    fn eject(mut self) -> PluginState {
        self.state = PluginState::Unloading;
        drop(self.library.take());
        if let Some(artifact) = self.artifact.take()
            && let Err(e) = artifact.close()
        {
            tracing::warn!(plugin = %self.name, error = %e, "Failed to remove plugin copy");
        }
        self.state = PluginState::Unloaded;
        tracing::info!(plugin = %self.name, "Plugin ejected");
        self.state
    }
}

/// Static description of a plugin, as reported by `check`
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub library_path: PathBuf,
    pub api_version: u32,
    pub entrypoint: String,
    pub copied: bool,
}

/// Result of calling an entrypoint once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    /// Unload invocations observed by the time the entrypoint returned
    pub unload_calls: u32,
    /// Time spent inside the entrypoint
    pub elapsed: Duration,
}

impl Handshake {
    /// Whether the plugin signaled unload before returning
    pub fn signaled(&self) -> bool {
        self.unload_calls > 0
    }
}

/// What happened to the plugin at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub plugin: String,
    pub state: PluginState,
    pub unload_calls: u32,
    pub elapsed: Duration,
}

/// Call `entry` once with the host's unload callback.
///
/// Resets the process-wide signal first. The returned handshake reflects
/// the signal as it was when the entrypoint returned.
///
/// # Safety
///
/// `entry` must follow the entrypoint ABI: an `extern "C"` function taking
/// the address of an `extern "C" fn()`.
pub unsafe fn handshake(name: &str, entry: EntrypointFn) -> Handshake {
    UnloadSignal::reset();
    tracing::debug!(plugin = %name, "Calling entrypoint");

    let start = Instant::now();
    // SAFETY: forwarded to the caller.
    unsafe { entry(UnloadSignal::callback_addr()) };
    let elapsed = start.elapsed();

    let unload_calls = UnloadSignal::calls();
    tracing::debug!(plugin = %name, unload_calls, ?elapsed, "Entrypoint returned");

    Handshake {
        unload_calls,
        elapsed,
    }
}

/// The plugin host drives one plugin through load, handshake and eject
pub struct PluginHost {
    config: HostConfig,
}

impl PluginHost {
    /// Create a new plugin host with the given configuration
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Load the configured library and resolve its exports
    pub fn load(&self) -> Result<LoadedPlugin, HostError> {
        // 1. Find library file
        let configured = self.config.plugin_path()?;
        let library_path = if configured.is_dir() {
            find_library(&configured)?
        } else {
            configured
        };
        let name = plugin_name(&library_path);

        // 2. Optionally load from a temporary copy
        let artifact = if self.config.plugin.copy_artifacts {
            let copy = copy_to_temp(&library_path)?;
            tracing::debug!(plugin = %name, copy = %copy.display(), "Loading from copy");
            Some(copy)
        } else {
            None
        };
        let load_path: &Path = artifact.as_deref().unwrap_or(&library_path);

        // 3. Load dynamic library
        // SAFETY: the user pointed the host at this library; its initializers
        // run here.
        let library = unsafe { Library::new(load_path)? };

        // 4. Check API version
        // SAFETY: the version export is an extern "C" fn() -> u32 per the ABI.
        let api_version = unsafe {
            let version_fn: libloading::Symbol<ApiVersionFn> = library
                .get(API_VERSION_SYMBOL.as_bytes())
                .map_err(|source| HostError::SymbolNotFound {
                    symbol: API_VERSION_SYMBOL.to_string(),
                    source,
                })?;
            version_fn()
        };

        if api_version != API_VERSION {
            return Err(HostError::ApiVersionMismatch {
                expected: API_VERSION,
                found: api_version,
            });
        }

        // 5. Resolve the entrypoint
        let symbol = &self.config.entrypoint.symbol;
        // SAFETY: the symbol is declared as an entrypoint by the config; the
        // pointer is only used while `library` is held.
        let entry: EntrypointFn = unsafe {
            *library
                .get::<EntrypointFn>(symbol.as_bytes())
                .map_err(|source| HostError::SymbolNotFound {
                    symbol: symbol.clone(),
                    source,
                })?
        };

        tracing::info!(
            plugin = %name,
            path = %library_path.display(),
            api_version,
            "Plugin loaded"
        );

        Ok(LoadedPlugin {
            name,
            library_path,
            api_version,
            entry,
            state: PluginState::Loaded,
            library: Some(library),
            artifact,
        })
    }

    /// Load and describe the plugin without calling its entrypoint
    pub fn check(&self) -> Result<PluginInfo, HostError> {
        let plugin = self.load()?;
        let info = plugin.info(&self.config.entrypoint.symbol);
        plugin.eject();
        Ok(info)
    }

    /// Load the plugin, call its entrypoint and, if configured, wait for the
    /// unload signal and eject it.
    pub fn run(&self) -> Result<RunReport, HostError> {
        let mut plugin = self.load()?;
        let start = Instant::now();

        plugin.state = PluginState::Working;
        // SAFETY: `entry` was resolved from the library held by `plugin`.
        let handshake = unsafe { handshake(&plugin.name, plugin.entry) };

        let name = plugin.name.clone();
        let report = |state: PluginState| RunReport {
            plugin: name.clone(),
            state,
            unload_calls: UnloadSignal::calls(),
            elapsed: start.elapsed(),
        };

        if !self.config.entrypoint.unload {
            let state = plugin.leak();
            return Ok(report(state));
        }

        if !handshake.signaled() {
            tracing::info!(plugin = %name, "Waiting for plugin to signal unload");
            let host = &self.config.host;
            if !UnloadSignal::wait(host.poll_interval(), host.unload_timeout()) {
                // The plugin may still be running; keep it mapped.
                plugin.leak();
                return Err(HostError::UnloadTimeout {
                    name: name.clone(),
                    timeout: host.unload_timeout().unwrap_or_default(),
                });
            }
        }

        let state = plugin.eject();
        Ok(report(state))
    }
}

/// Find the one plugin library in a directory
fn find_library(dir: &Path) -> Result<PathBuf, HostError> {
    let extensions: &[&str] = if cfg!(target_os = "macos") {
        &["dylib", "so"]
    } else if cfg!(target_os = "windows") {
        &["dll"]
    } else {
        &["so"]
    };

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| extensions.contains(&e))
        })
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(HostError::LibraryNotFound {
            path: dir.to_path_buf(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(HostError::AmbiguousLibrary {
            dir: dir.to_path_buf(),
            candidates,
        }),
    }
}

/// Plugin name from a library path: `libhello_plugin.so` -> `hello_plugin`
fn plugin_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("plugin");
    stem.strip_prefix("lib").unwrap_or(stem).to_string()
}

/// Copy a library to a uniquely named temp file with the same extension
fn copy_to_temp(path: &Path) -> Result<TempPath, HostError> {
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let copy = tempfile::Builder::new()
        .prefix("tether-")
        .suffix(&suffix)
        .tempfile()?
        .into_temp_path();
    std::fs::copy(path, &copy)?;
    Ok(copy)
}
