use std::env;
use std::path::PathBuf;

use repro_core::APP_NAME;

/// XDG Base Directory paths for repro
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CONFIG_HOME/repro or fallback
    pub fn config_dir() -> PathBuf {
        Self::base("XDG_CONFIG_HOME", ".config").join(APP_NAME)
    }

    /// Get XDG_CACHE_HOME/repro or fallback
    pub fn cache_dir() -> PathBuf {
        Self::base("XDG_CACHE_HOME", ".cache").join(APP_NAME)
    }

    /// Default settings file location
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    fn base(var: &str, home_relative: &str) -> PathBuf {
        env::var_os(var)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|home| home.join(home_relative))
                    .unwrap_or_else(|| PathBuf::from(home_relative))
            })
    }
}
