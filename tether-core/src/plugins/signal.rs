//! UnloadSignal - the host end of the unload handle
//!
//! The callback handed to plugins is a plain `extern "C" fn()` and cannot
//! carry state, so the signal lives in a process-wide counter. One plugin
//! runs at a time per host; [`UnloadSignal::reset`] is called before every
//! handshake.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tether_plugin_api::UnloadFn;

static UNLOAD_CALLS: AtomicU32 = AtomicU32::new(0);

unsafe extern "C" fn host_unload() {
    let previous = UNLOAD_CALLS.fetch_add(1, Ordering::SeqCst);
    if previous == 0 {
        tracing::debug!("Plugin signaled unload");
    } else {
        tracing::warn!(
            calls = previous + 1,
            "Plugin invoked its unload handle more than once, ignoring"
        );
    }
}

/// Accessors for the process-wide unload signal
pub struct UnloadSignal;

impl UnloadSignal {
    /// Clear the signal before handing the callback to a new plugin
    pub fn reset() {
        UNLOAD_CALLS.store(0, Ordering::SeqCst);
    }

    /// The callback plugins invoke
    pub fn callback() -> UnloadFn {
        host_unload
    }

    /// Address of the callback, as passed across the entrypoint boundary
    pub fn callback_addr() -> usize {
        Self::callback() as usize
    }

    /// How many times the callback ran since the last reset
    pub fn calls() -> u32 {
        UNLOAD_CALLS.load(Ordering::SeqCst)
    }

    /// Whether the plugin has asked to be unloaded
    pub fn is_signaled() -> bool {
        Self::calls() > 0
    }

    /// Block until the signal is set, checking every `poll_interval`.
    ///
    /// Returns `false` if `timeout` elapses first. With no timeout this only
    /// returns once the plugin signals.
    pub fn wait(poll_interval: Duration, timeout: Option<Duration>) -> bool {
        let start = Instant::now();
        loop {
            if Self::is_signaled() {
                return true;
            }

            if timeout.is_some_and(|t| start.elapsed() >= t) {
                return false;
            }

            std::thread::sleep(poll_interval);
        }
    }
}
