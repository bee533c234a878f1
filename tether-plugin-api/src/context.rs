//! EntrypointContext - what the plugin's work function gets to hold

use crate::handle::UnloadHandle;

/// How an entrypoint invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// The entrypoint invoked the unload handle before returning
    Unloaded,
    /// The work function took the handle and will invoke it later
    Deferred,
}

/// Per-invocation state owned by the entrypoint.
///
/// Holds the converted unload handle for the duration of the plugin's work.
/// Unless the work function calls [`take_unload`](Self::take_unload), the
/// entrypoint invokes the handle once the work function has returned.
#[derive(Debug)]
pub struct EntrypointContext {
    plugin_name: String,
    unload: Option<UnloadHandle>,
}

impl EntrypointContext {
    /// Create a context around an already converted handle
    pub fn new(plugin_name: impl Into<String>, unload: UnloadHandle) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            unload: Some(unload),
        }
    }

    /// Name the plugin was exported under
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Take ownership of the unload handle to keep the plugin resident.
    ///
    /// The caller becomes responsible for invoking it exactly once, after all
    /// of its own cleanup. Returns `None` if the handle was already taken.
    pub fn take_unload(&mut self) -> Option<UnloadHandle> {
        self.unload.take()
    }

    /// Whether the context still holds the unload handle
    pub fn holds_unload(&self) -> bool {
        self.unload.is_some()
    }

    /// Consume the context, yielding the handle if it is still held.
    ///
    /// Dropping the context first means nothing it owns is torn down after
    /// the handle has been invoked.
    pub(crate) fn into_unload(mut self) -> Option<UnloadHandle> {
        self.unload.take()
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log an info message
    pub fn log_info(&self, message: &str) {
        tracing::info!(plugin = %self.plugin_name, "{}", message);
    }

    /// Log a warning message
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(plugin = %self.plugin_name, "{}", message);
    }

    /// Log an error message
    pub fn log_error(&self, message: &str) {
        tracing::error!(plugin = %self.plugin_name, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::UnloadFn;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DEFER_CALLS: AtomicU32 = AtomicU32::new(0);

    unsafe extern "C" fn on_defer() {
        DEFER_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_held_handle_is_yielded() {
        let ctx = EntrypointContext::new("test", UnloadHandle::from_fn(on_defer as UnloadFn));
        assert!(ctx.holds_unload());
        assert_eq!(ctx.plugin_name(), "test");

        let handle = ctx.into_unload().unwrap();
        assert_eq!(handle.addr(), on_defer as UnloadFn as usize);
    }

    #[test]
    fn test_taken_handle_is_not_yielded_again() {
        let mut ctx = EntrypointContext::new("test", UnloadHandle::from_fn(on_defer as UnloadFn));
        let handle = ctx.take_unload().unwrap();
        assert!(!ctx.holds_unload());
        assert!(ctx.take_unload().is_none());
        assert!(ctx.into_unload().is_none());

        let before = DEFER_CALLS.load(Ordering::SeqCst);
        handle.invoke();
        assert_eq!(DEFER_CALLS.load(Ordering::SeqCst), before + 1);
    }
}
