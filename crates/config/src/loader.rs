//! Layered settings loader
//!
//! Layers, lowest precedence first: built-in defaults, a JSON settings file,
//! `REPRO_*` environment variables. Command-line flags are applied by the
//! caller on the returned value.

use crate::settings::Settings;
use crate::validation::validate;
use repro_core::{Error, Result, ENV_VAR_PREFIX};
use repro_utils::XdgPaths;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads `Settings` from file and environment
pub struct SettingsLoader {
    /// Explicit settings file; must exist when given
    file: Option<PathBuf>,
    /// Environment snapshot; `None` reads the process environment
    vars: Option<Vec<(String, String)>>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            vars: None,
        }
    }

    /// Use this settings file instead of the XDG default
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use these variables instead of the process environment
    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn load(self) -> Result<Settings> {
        let mut settings = match &self.file {
            Some(path) => read_file(path)?,
            None => {
                let default_path = XdgPaths::config_file();
                if default_path.is_file() {
                    read_file(&default_path)?
                } else {
                    Settings::default()
                }
            }
        };

        let vars = self.vars.unwrap_or_else(|| std::env::vars().collect());
        apply_env(&mut settings, vars)?;

        validate(&settings)?;
        tracing::debug!(?settings, "settings resolved");
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read settings file", e))?;
    serde_json::from_str(&content).map_err(|e| {
        Error::configuration(format!("invalid settings file '{}': {e}", path.display()))
    })
}

/// Overlay `REPRO_*` variables onto `settings`
///
/// Unknown `REPRO_*` names are ignored; malformed values are errors.
pub fn apply_env<I>(settings: &mut Settings, vars: I) -> Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ENV_VAR_PREFIX) else {
            continue;
        };

        match name {
            "WORK_DIR" => settings.work_dir = PathBuf::from(value),
            "CACHE_DIR" => settings.cache_dir = PathBuf::from(value),
            "USE_CACHE" => settings.use_cache = parse_bool(&key, &value)?,
            "TIMEOUT_MINUTES" => settings.timeout_minutes = parse(&key, &value)?,
            "INTERACTIVE" => settings.interactive = parse_bool(&key, &value)?,
            "ENVIRONMENT" => settings.environment = value.parse()?,
            "PREFER_DOCKER" => settings.prefer_docker = parse_bool(&key, &value)?,
            "PREFER_CONDA" => settings.prefer_conda = parse_bool(&key, &value)?,
            "PYTHON" => settings.python = value,
            "CONDA_PYTHON" => settings.conda_python = value,
            "INSTALL_TIMEOUT_SECS" => settings.install_timeout_secs = parse(&key, &value)?,
            "DOCKER_BUILD_TIMEOUT_SECS" => {
                settings.docker_build_timeout_secs = parse(&key, &value)?
            }
            "MAX_CAPTURED_OUTPUT_BYTES" => {
                settings.max_captured_output_bytes = parse(&key, &value)?
            }
            "RETRY_MAX_ATTEMPTS" => settings.retry.max_attempts = parse(&key, &value)?,
            "RETRY_BASE_DELAY_MS" => settings.retry.base_delay_ms = parse(&key, &value)?,
            "RETRY_MAX_DELAY_MS" => settings.retry.max_delay_ms = parse(&key, &value)?,
            "RETRY_MULTIPLIER" => settings.retry.multiplier = parse(&key, &value)?,
            _ => tracing::debug!(variable = %key, "ignoring unknown setting variable"),
        }
    }
    Ok(())
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::configuration(format!("invalid value '{value}' for {key}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::configuration(format!(
            "invalid boolean '{value}' for {key}"
        ))),
    }
}
