//! C ABI shared by the host and plugins

/// Current entrypoint ABI version. Plugins must match this exactly.
pub const API_VERSION: u32 = 1;

/// Default name of the exported entrypoint symbol.
pub const ENTRYPOINT_SYMBOL: &str = "tether_main";

/// Name of the exported ABI version function.
pub const API_VERSION_SYMBOL: &str = "_tether_api_version";

/// Host-supplied callback the plugin invokes to signal it may be unloaded.
pub type UnloadFn = unsafe extern "C" fn();

/// Plugin entrypoint. Receives the address of an [`UnloadFn`].
pub type EntrypointFn = unsafe extern "C" fn(usize);

/// Version function exported next to the entrypoint.
pub type ApiVersionFn = extern "C" fn() -> u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_is_set() {
        assert_eq!(API_VERSION, 1);
    }

    #[test]
    fn test_unload_fn_fits_in_address() {
        assert_eq!(
            std::mem::size_of::<UnloadFn>(),
            std::mem::size_of::<usize>()
        );
    }
}
