//! Error types for plugin authors

use thiserror::Error;

/// Errors that can occur on the plugin side of the entrypoint
#[derive(Error, Debug)]
pub enum PluginError {
    /// The host passed a null unload address
    #[error("Unload handle is null")]
    NullUnloadHandle,

    /// The unload address does not fall inside any loaded image
    #[error("Unload handle {addr:#x} does not point into a loaded module")]
    UnmappedUnloadHandle { addr: usize },

    /// The unload address is inside a loaded image but not in its code
    #[error("Unload handle {addr:#x} does not point at executable code")]
    NonExecutableUnloadHandle { addr: usize },

    /// The work function panicked
    #[error("Plugin panicked: {0}")]
    Panicked(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl PluginError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Whether this error comes from converting the host's unload address.
    ///
    /// These are host/plugin contract violations; the entrypoint must not
    /// continue after one.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::NullUnloadHandle
                | Self::UnmappedUnloadHandle { .. }
                | Self::NonExecutableUnloadHandle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            PluginError::NullUnloadHandle.to_string(),
            "Unload handle is null"
        );

        let err = PluginError::UnmappedUnloadHandle { addr: 0x10 };
        assert!(err.to_string().contains("0x10"));

        let err = PluginError::NonExecutableUnloadHandle { addr: 0x2a };
        assert!(err.to_string().contains("0x2a"));
        assert!(err.to_string().contains("executable"));

        let custom_err = PluginError::Custom("something happened".to_string());
        assert_eq!(custom_err.to_string(), "something happened");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let plugin_err: PluginError = io_err.into();

        assert!(matches!(plugin_err, PluginError::Io(_)));
        assert!(plugin_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_contract_violations() {
        assert!(PluginError::NullUnloadHandle.is_contract_violation());
        assert!(PluginError::UnmappedUnloadHandle { addr: 1 }.is_contract_violation());
        assert!(PluginError::NonExecutableUnloadHandle { addr: 1 }.is_contract_violation());
        assert!(!PluginError::custom("work failed").is_contract_violation());
        assert!(!PluginError::Panicked("boom".into()).is_contract_violation());
    }
}
