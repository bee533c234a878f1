//! Hello Plugin - A minimal tether plugin
//!
//! The host calls `tether_main` with the address of its unload callback.
//! This plugin shows a message box and returns; `export_entrypoint!` then
//! invokes the unload handle so the host can eject the library.
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Running
//!
//! ```bash
//! tether config init target/release/libhello_plugin.so --output hello.toml
//! tether run hello.toml
//! ```

use tether_plugin_api::{EntrypointContext, PluginError, export_entrypoint, show_message};

fn hello(ctx: &mut EntrypointContext) -> Result<(), PluginError> {
    // The plugin has its own copy of tracing; give it somewhere to write for
    // the length of this call. The guard restores the previous default when
    // it drops, so nothing of ours is left registered once we unload.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    show_message("hello-plugin", "Hello from the tether entrypoint!");

    ctx.log_info("Done, unloading");
    Ok(())
}

// Generates `tether_main` and `_tether_api_version`
export_entrypoint!(hello);

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use tether_plugin_api::{UnloadFn, UnloadHandle};

    unsafe extern "C" fn ignore_unload() {}

    #[test]
    fn hello_leaves_no_subscriber_behind() {
        let mut ctx =
            EntrypointContext::new("hello-plugin", UnloadHandle::from_fn(ignore_unload as UnloadFn));

        hello(&mut ctx).unwrap();

        assert!(!tracing::dispatcher::has_been_set());
        assert!(tracing::dispatcher::get_default(|d| {
            d.is::<tracing::subscriber::NoSubscriber>()
        }));
        assert!(ctx.holds_unload());
    }
}
