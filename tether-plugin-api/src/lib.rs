//! tether-plugin-api - Entrypoint ABI for tether plugins
//!
//! A tether plugin is a native dynamic library exporting a single entrypoint.
//! The host calls it with the address of an unload callback; the plugin does
//! its work and then invokes that callback to hand control back.
//!
//! # Example
//!
//! ```ignore
//! use tether_plugin_api::{EntrypointContext, PluginError, export_entrypoint, show_message};
//!
//! fn work(ctx: &mut EntrypointContext) -> Result<(), PluginError> {
//!     show_message("my-plugin", "Hello from the entrypoint!");
//!     ctx.log_info("done, unloading");
//!     Ok(())
//! }
//!
//! export_entrypoint!(work);
//! ```

pub mod abi;
pub mod context;
pub mod dialog;
pub mod error;
pub mod handle;

pub use abi::{
    API_VERSION, API_VERSION_SYMBOL, ApiVersionFn, ENTRYPOINT_SYMBOL, EntrypointFn, UnloadFn,
};
pub use context::{EntrypointContext, Finish};
pub use dialog::show_message;
pub use error::PluginError;
pub use handle::UnloadHandle;

#[doc(hidden)]
pub use tracing as __tracing;

use std::panic::AssertUnwindSafe;

/// Drive one entrypoint invocation.
///
/// Converts `unload_addr`, runs `work` with panic isolation, and then invokes
/// the unload handle unless `work` took it. A failed or panicking `work` is
/// logged and still followed by the unload: whatever cleanup the plugin does
/// has finished by then.
///
/// Only the address conversion can fail. In that case nothing is invoked.
///
/// Invoking the handle is the last thing this function does: every log line
/// and every drop of plugin-owned state happens before it.
///
/// # Safety
///
/// See [`UnloadHandle::from_addr`].
pub unsafe fn run_entrypoint<F>(
    plugin_name: &str,
    unload_addr: usize,
    work: F,
) -> Result<Finish, PluginError>
where
    F: FnOnce(&mut EntrypointContext) -> Result<(), PluginError>,
{
    // SAFETY: forwarded to the caller.
    let handle = unsafe { UnloadHandle::from_addr(unload_addr) }?;
    let mut ctx = EntrypointContext::new(plugin_name, handle);

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| work(&mut ctx)))
        .unwrap_or_else(|payload| Err(PluginError::Panicked(panic_message(&*payload))));

    if let Err(e) = result {
        tracing::error!(plugin = %plugin_name, error = %e, "Plugin work failed");
    }

    let finish = if ctx.holds_unload() {
        Finish::Unloaded
    } else {
        Finish::Deferred
    };
    tracing::debug!(plugin = %plugin_name, ?finish, "Entrypoint finished");

    if let Some(handle) = ctx.into_unload() {
        handle.invoke();
    }
    Ok(finish)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Export a work function as the plugin's entrypoint.
///
/// The work function has the signature
/// `fn(&mut EntrypointContext) -> Result<(), PluginError>`.
///
/// # Generated Functions
///
/// - `tether_main(unload: usize)`: the entrypoint the host calls
/// - `_tether_api_version()`: returns [`API_VERSION`]
#[macro_export]
macro_rules! export_entrypoint {
    ($work:path) => {
        /// # Safety
        ///
        /// `unload` must be the address of the host's unload callback.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn tether_main(unload: usize) {
            // SAFETY: the host supplies its unload callback per the ABI.
            let result =
                unsafe { $crate::run_entrypoint(env!("CARGO_PKG_NAME"), unload, $work) };
            if let Err(e) = result {
                $crate::__tracing::error!(
                    plugin = env!("CARGO_PKG_NAME"),
                    error = %e,
                    "Entrypoint aborted, host contract violated"
                );
            }
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _tether_api_version() -> u32 {
            $crate::API_VERSION
        }
    };
}
