//! User settings for nexo-envelope
//!
//! Manages which key block is loaded at startup and whether protocol
//! messages are sealed at all.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::EnvelopePaths;
use crate::crypto::bundle::{
    check_embedded_identity, PROVISIONED_KEY_IDENTIFIER, PROVISIONED_KEY_VERSION,
};
use crate::crypto::envelope::CRYPTO_VERSION;
use crate::error::EnvelopeError;

/// Where the 80-byte key block comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KeySource {
    /// The block compiled into the binary
    #[default]
    Embedded,
    /// A base64 block held in an environment variable
    Env { var: String },
    /// A base64 block held in a file
    File { path: PathBuf },
}

impl KeySource {
    /// Short label for logs; never includes key bytes
    pub fn describe(&self) -> &'static str {
        match self {
            KeySource::Embedded => "embedded",
            KeySource::Env { .. } => "env",
            KeySource::File { .. } => "file",
        }
    }
}

/// Key identity and source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySettings {
    /// Key family written into trailers
    #[serde(default = "default_key_identifier")]
    pub identifier: String,

    /// Key generation written into trailers
    #[serde(default = "default_key_version")]
    pub version: u32,

    /// Where to load the key block from
    #[serde(default)]
    pub source: KeySource,
}

fn default_key_identifier() -> String {
    PROVISIONED_KEY_IDENTIFIER.to_string()
}

fn default_key_version() -> u32 {
    PROVISIONED_KEY_VERSION
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            identifier: default_key_identifier(),
            version: default_key_version(),
            source: KeySource::default(),
        }
    }
}

/// User settings for nexo-envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Seal protocol messages; when off, messages pass through in clear
    #[serde(default = "default_encryption_enabled")]
    pub encryption_enabled: bool,

    /// Key block identity and source
    #[serde(default)]
    pub key: KeySettings,

    /// Envelope format version (informational; only one is supported)
    #[serde(default = "default_crypto_version")]
    pub crypto_version: u32,
}

fn default_encryption_enabled() -> bool {
    true
}

fn default_crypto_version() -> u32 {
    CRYPTO_VERSION
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            encryption_enabled: default_encryption_enabled(),
            key: KeySettings::default(),
            crypto_version: default_crypto_version(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &EnvelopePaths) -> Result<Self, EnvelopeError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                EnvelopeError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                EnvelopeError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &EnvelopePaths) -> Result<(), EnvelopeError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            EnvelopeError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            EnvelopeError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Reject settings this build cannot honour
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.crypto_version != CRYPTO_VERSION {
            return Err(EnvelopeError::Config(format!(
                "Unsupported crypto version {} (supported: {})",
                self.crypto_version, CRYPTO_VERSION
            )));
        }
        if self.key.identifier.is_empty() {
            return Err(EnvelopeError::Config("Key identifier is empty".into()));
        }
        if self.key.source == KeySource::Embedded {
            check_embedded_identity(&self.key)?;
        }
        Ok(())
    }
}
