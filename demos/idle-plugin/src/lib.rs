//! Idle Plugin - takes the unload handle and never invokes it
//!
//! Exercises the host's side of a plugin that stays resident without ever
//! signaling: with `host.unload_timeout_ms` set, `tether run` gives up and
//! reports the timeout, leaving the library mapped.

use tether_plugin_api::{EntrypointContext, PluginError, export_entrypoint};

fn idle(ctx: &mut EntrypointContext) -> Result<(), PluginError> {
    // Taking the handle stops the entrypoint from invoking it on return.
    let parked = ctx.take_unload();
    ctx.log_warn("Holding the unload handle; the host will have to give up");
    drop(parked);
    Ok(())
}

export_entrypoint!(idle);
