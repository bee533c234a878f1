//! Where tether looks for its host config.
//!
//! The lookup order for the default config file is:
//!
//! 1. `$TETHER_CONFIG`, taken as the file itself
//! 2. `$XDG_CONFIG_HOME/tether/tether.toml`
//! 3. `~/.config/tether/tether.toml`
//!
//! XDG layout is used on every platform, not only Linux. Per the XDG base
//! directory rules an empty or relative `$XDG_CONFIG_HOME` is ignored.

use std::ffi::OsString;
use std::path::PathBuf;

/// File name of the host config inside [`config_dir`]
pub const CONFIG_FILE: &str = "tether.toml";

/// Environment variable naming the config file outright
pub const CONFIG_ENV: &str = "TETHER_CONFIG";

const APP_DIR: &str = "tether";

/// Directory holding the host config.
///
/// # Examples
///
/// ```
/// use tether_paths::config_dir;
///
/// assert!(config_dir().ends_with("tether"));
/// ```
pub fn config_dir() -> PathBuf {
    let base = absolute_env("XDG_CONFIG_HOME")
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join(APP_DIR)
}

/// Config file used when none is given on the command line
pub fn default_config_file() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join(CONFIG_FILE))
}

fn absolute_env(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v: &OsString| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Run `f` with the given variables set (`Some`) or removed (`None`)
    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        let saved: Vec<_> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var_os(k)))
            .collect();
        for (k, v) in vars {
            match v {
                Some(v) => unsafe { std::env::set_var(k, v) },
                None => unsafe { std::env::remove_var(k) },
            }
        }
        f();
        for (k, v) in saved {
            match v {
                Some(v) => unsafe { std::env::set_var(k, v) },
                None => unsafe { std::env::remove_var(k) },
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_dir_respects_xdg_env() {
        with_env(&[("XDG_CONFIG_HOME", Some("/tmp/test-config"))], || {
            assert_eq!(config_dir(), PathBuf::from("/tmp/test-config/tether"));
        });
    }

    #[test]
    #[serial]
    fn test_empty_or_relative_xdg_is_ignored() {
        for value in ["", "relative/config"] {
            with_env(&[("XDG_CONFIG_HOME", Some(value))], || {
                let dir = config_dir();
                assert!(dir.ends_with(".config/tether"), "got {}", dir.display());
                assert!(!dir.starts_with("relative"));
            });
        }
    }

    #[test]
    #[serial]
    fn test_default_config_file_lives_in_config_dir() {
        with_env(
            &[
                (CONFIG_ENV, None),
                ("XDG_CONFIG_HOME", Some("/tmp/test-config")),
            ],
            || {
                assert_eq!(
                    default_config_file(),
                    PathBuf::from("/tmp/test-config/tether/tether.toml")
                );
            },
        );
    }

    #[test]
    #[serial]
    fn test_config_env_overrides_default_file() {
        with_env(
            &[
                (CONFIG_ENV, Some("/srv/hosts/plugin.toml")),
                ("XDG_CONFIG_HOME", Some("/tmp/test-config")),
            ],
            || {
                assert_eq!(
                    default_config_file(),
                    PathBuf::from("/srv/hosts/plugin.toml")
                );
            },
        );
    }
}
