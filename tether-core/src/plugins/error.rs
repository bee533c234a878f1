//! Plugin host error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the plugin host
#[derive(Error, Debug)]
pub enum HostError {
    /// Config file could not be parsed
    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Plugin library not found
    #[error("Plugin library not found: {path}")]
    LibraryNotFound { path: PathBuf },

    /// A plugin directory holds more than one library
    #[error("More than one plugin library in {dir}: {candidates:?}")]
    AmbiguousLibrary {
        dir: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// Failed to load dynamic library
    #[error("Failed to load plugin library: {0}")]
    LibraryLoad(#[from] libloading::Error),

    /// A required export is missing from the library
    #[error("Plugin does not export '{symbol}': {source}")]
    SymbolNotFound {
        symbol: String,
        #[source]
        source: libloading::Error,
    },

    /// API version mismatch between host and plugin
    #[error("API version mismatch: host expects {expected}, plugin has {found}")]
    ApiVersionMismatch { expected: u32, found: u32 },

    /// The plugin never invoked its unload handle
    #[error("Plugin '{name}' did not signal unload within {timeout:?}")]
    UnloadTimeout { name: String, timeout: Duration },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_not_found_display() {
        let err = HostError::LibraryNotFound {
            path: PathBuf::from("/some/path/libfoo.so"),
        };
        assert!(err.to_string().contains("/some/path/libfoo.so"));
    }

    #[test]
    fn test_ambiguous_library_display() {
        let err = HostError::AmbiguousLibrary {
            dir: PathBuf::from("/plugins"),
            candidates: vec![
                PathBuf::from("/plugins/liba.so"),
                PathBuf::from("/plugins/libb.so"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("/plugins"));
        assert!(msg.contains("liba.so"));
        assert!(msg.contains("libb.so"));
    }

    #[test]
    fn test_api_version_mismatch_display() {
        let err = HostError::ApiVersionMismatch {
            expected: 1,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("expects 1"));
        assert!(msg.contains("has 2"));
    }

    #[test]
    fn test_unload_timeout_display() {
        let err = HostError::UnloadTimeout {
            name: "slow-plugin".to_string(),
            timeout: Duration::from_secs(5),
        };
        let msg = err.to_string();
        assert!(msg.contains("slow-plugin"));
        assert!(msg.contains("5"));
    }

    #[test]
    fn test_config_display() {
        let err = HostError::Config {
            path: PathBuf::from("tether.toml"),
            message: "missing field `plugin`".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tether.toml"));
        assert!(msg.contains("missing field"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HostError = io_err.into();
        assert!(matches!(err, HostError::Io(_)));
    }
}
