//! Where the settings file lives
//!
//! `NEXO_ENVELOPE_HOME` wins; otherwise `$XDG_CONFIG_HOME/nexo-envelope`,
//! `~/.config/nexo-envelope`, or `%APPDATA%\nexo-envelope` on Windows.

use std::path::PathBuf;

use crate::error::EnvelopeError;

/// Environment variable that overrides the base directory
pub const HOME_ENV_VAR: &str = "NEXO_ENVELOPE_HOME";

/// Settings location
#[derive(Debug, Clone)]
pub struct EnvelopePaths {
    base_dir: PathBuf,
}

impl EnvelopePaths {
    /// Resolve the base directory from the environment
    ///
    /// Returns `Config` when no home directory can be found.
    pub fn new() -> Result<Self, EnvelopeError> {
        let base_dir = match std::env::var_os(HOME_ENV_VAR) {
            Some(custom) => PathBuf::from(custom),
            None => default_base_dir()?,
        };
        Ok(Self { base_dir })
    }

    /// Use an explicit base directory
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// `config.json` under the base directory
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Create the base directory and its parents
    pub fn ensure_directories(&self) -> Result<(), EnvelopeError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| EnvelopeError::Io(format!("Failed to create base directory: {}", e)))
    }

    /// Whether `init` has written a settings file
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn default_base_dir() -> Result<PathBuf, EnvelopeError> {
    let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) => PathBuf::from(xdg),
        None => std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config"))
            .ok_or_else(|| EnvelopeError::Config("HOME is not set".into()))?,
    };
    Ok(config_home.join("nexo-envelope"))
}

#[cfg(windows)]
fn default_base_dir() -> Result<PathBuf, EnvelopeError> {
    std::env::var_os("APPDATA")
        .map(|appdata| PathBuf::from(appdata).join("nexo-envelope"))
        .ok_or_else(|| EnvelopeError::Config("APPDATA is not set".into()))
}
